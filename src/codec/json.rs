//! JSON encoder/decoder and the default error decoder.

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde_json::Value;

use crate::codec::{Decoder, Encoder, ErrorDecoder};
use crate::error::{ClientError, ClientResult};
use crate::transport::{Request, Response};

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder;

impl Encoder for JsonEncoder {
    fn encode(&self, body: &Value, request: &mut Request) -> ClientResult<()> {
        let bytes = serde_json::to_vec(body).map_err(|e| ClientError::Encode(e.to_string()))?;
        request
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        request.body = Some(bytes);
        Ok(())
    }
}

/// Empty bodies decode to `Value::Null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn decode(&self, response: &Response) -> ClientResult<Value> {
        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&response.body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Maps every non-success response to `ClientError::Status`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorDecoder;

impl ErrorDecoder for DefaultErrorDecoder {
    fn decode(&self, method_key: &str, response: &Response) -> ClientError {
        ClientError::Status {
            status: response.status.as_u16(),
            method_key: method_key.to_string(),
            body: response.text(),
        }
    }
}
