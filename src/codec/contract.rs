//! Default request contract.
//!
//! Path templates use `{name}` variables. Query pairs and headers come from the
//! call arguments.

use reqwest::Method;
use url::form_urlencoded;

use crate::codec::{Arguments, Contract, MethodMetadata};
use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

/// A parsed method template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTemplate {
    pub method: Method,
    segments: Vec<Segment>,
    pub headers: Vec<(String, String)>,
}

impl RequestTemplate {
    /// Names of the path variables, in template order.
    pub fn variables(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Variable(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Expand against `base_url` with the call's arguments.
    pub fn expand(&self, method_key: &str, base_url: &str, args: &Arguments) -> ClientResult<String> {
        let mut url = base_url.trim_end_matches('/').to_string();
        let mut path = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Variable(name) => {
                    let value = args.path.get(name).ok_or_else(|| ClientError::Template {
                        method: method_key.to_string(),
                        message: format!("no value for path variable {{{}}}", name),
                    })?;
                    path.push_str(&encode_path_value(value));
                }
            }
        }
        if !path.is_empty() && !path.starts_with('/') {
            url.push('/');
        }
        url.push_str(&path);

        if !args.query.is_empty() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(args.query.iter())
                .finish();
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&query);
        }
        Ok(url)
    }
}

fn encode_path_value(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// `{name}` path templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultContract;

impl Contract for DefaultContract {
    fn parse(&self, method: &MethodMetadata) -> ClientResult<RequestTemplate> {
        let template_error = |message: String| ClientError::Template {
            method: method.name.clone(),
            message,
        };

        let mut segments = Vec::new();
        let mut rest = method.path.as_str();
        while let Some(open) = rest.find('{') {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| template_error(format!("unclosed '{{' in {}", method.path)))?;
            let name = after[..close].trim();
            if name.is_empty() || name.contains('{') {
                return Err(template_error(format!("invalid variable in {}", method.path)));
            }
            segments.push(Segment::Variable(name.to_string()));
            rest = &after[close + 1..];
        }
        if rest.contains('}') {
            return Err(template_error(format!("unmatched '}}' in {}", method.path)));
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(RequestTemplate {
            method: method.http_method.clone(),
            segments,
            headers: method.headers.clone(),
        })
    }
}
