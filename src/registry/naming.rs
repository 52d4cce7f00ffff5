//! Name, URL and path rules for client declarations.

use url::Url;

use crate::config::PropertyResolver;
use crate::error::{ClientError, ClientResult, ValidationError};
use crate::registry::ClientAttributes;

/// Trim, ensure a leading `/`, drop a trailing `/`. Blank input yields "".
pub fn normalize_path(path: &str) -> String {
    let path = path.trim();
    if path.is_empty() {
        return String::new();
    }
    let mut normalized = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    if normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// Prefix `http://` when the URL has no scheme, then require it to parse.
///
/// Blank input yields `None`.
pub fn normalize_url(url: &str) -> ClientResult<Option<String>> {
    let url = url.trim();
    if url.is_empty() {
        return Ok(None);
    }
    let url = if url.contains("://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    };
    Url::parse(&url).map_err(|source| ClientError::MalformedUrl {
        url: url.clone(),
        source,
    })?;
    Ok(Some(url))
}

/// The name must be usable as the authority of an `http://` URL.
pub fn validate_hostname(name: &str) -> Result<(), ValidationError> {
    let legal = Url::parse(&format!("http://{}", name))
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .is_some_and(|host| {
            !host.is_empty()
                && host
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '[' | ']' | ':'))
        });
    if legal {
        Ok(())
    } else {
        Err(ValidationError::IllegalHostname(name.to_string()))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn resolve_name(
    raw: &str,
    attribute: &'static str,
    type_name: &str,
    resolver: &dyn PropertyResolver,
) -> Result<String, ValidationError> {
    let resolved = resolver.resolve_placeholders(raw).trim().to_string();
    if resolved.is_empty() {
        return Err(ValidationError::EmptyAttribute {
            type_name: type_name.to_string(),
            attribute,
        });
    }
    validate_hostname(&resolved)?;
    Ok(resolved)
}

/// Service name: `service_id`, then `value`, then `name`, then `context_id`.
pub fn resolve_service_name(
    attributes: &ClientAttributes,
    resolver: &dyn PropertyResolver,
    type_name: &str,
) -> Result<String, ValidationError> {
    let raw = non_blank(&attributes.service_id)
        .or_else(|| non_blank(&attributes.value))
        .or_else(|| non_blank(&attributes.name))
        .or_else(|| non_blank(&attributes.context_id))
        .ok_or_else(|| ValidationError::MissingName {
            type_name: type_name.to_string(),
        })?;
    resolve_name(raw, "name", type_name, resolver)
}

/// contextId: explicit `context_id`, else the service name.
pub fn resolve_context_id(
    attributes: &ClientAttributes,
    resolver: &dyn PropertyResolver,
    type_name: &str,
    service_name: &str,
) -> Result<String, ValidationError> {
    match non_blank(&attributes.context_id) {
        Some(raw) => resolve_name(raw, "context_id", type_name, resolver),
        None => Ok(service_name.to_string()),
    }
}

/// Alias under which the client is also registered.
pub fn alias_for(context_id: &str, qualifier: Option<&str>) -> String {
    match qualifier.map(str::trim).filter(|q| !q.is_empty()) {
        Some(qualifier) => qualifier.to_string(),
        None => format!("{}Client", context_id),
    }
}

/// True when `value` already carries an `http://` or `https://` scheme.
pub fn has_http_scheme(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Base URL of a Target: the declared URL, or `http://<service>`, plus the path.
pub fn base_url(service_name: &str, url: Option<&str>, path: &str) -> String {
    let root = match url.filter(|u| !u.is_empty()) {
        Some(url) if has_http_scheme(url) => url.to_string(),
        Some(url) => format!("http://{}", url),
        None if has_http_scheme(service_name) => service_name.to_string(),
        None => format!("http://{}", service_name),
    };
    format!("{}{}", root, normalize_path(path))
}
