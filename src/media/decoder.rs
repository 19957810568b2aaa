use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use super::validate::{Validate, ValidationError};
use crate::oauth_core::url_encoding::parse_query;

/// Wire encoding of a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Json,
    Form,
}

impl BodyFormat {
    /// Picks the format from the content type, sniffing the body when the
    /// header is absent or names neither encoding.
    pub fn detect(content_type: Option<&str>, body: &[u8]) -> Self {
        let mime = content_type.map(|ct| ct.to_ascii_lowercase()).unwrap_or_default();
        if mime.contains("json") {
            BodyFormat::Json
        } else if mime.contains("x-www-form-urlencoded") {
            BodyFormat::Form
        } else {
            match body.iter().find(|b| !b.is_ascii_whitespace()) {
                Some(b'{') | Some(b'[') => BodyFormat::Json,
                _ => BodyFormat::Form,
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("body is not valid UTF-8")]
    Utf8,
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Decodes `body` into `T` according to its content type.
///
/// Form bodies become a flat object of string values before being handed to
/// serde, so one target type serves both encodings.
pub fn decode<T: DeserializeOwned>(body: &[u8], content_type: Option<&str>) -> Result<T, DecodeError> {
    match BodyFormat::detect(content_type, body) {
        BodyFormat::Json => Ok(serde_json::from_slice(body)?),
        BodyFormat::Form => {
            let text = std::str::from_utf8(body).map_err(|_| DecodeError::Utf8)?;
            let object: Map<String, Value> = parse_query(text)
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            Ok(serde_json::from_value(Value::Object(object))?)
        }
    }
}

/// [`decode`] followed by [`Validate::validate`].
pub fn decode_validated<T>(body: &[u8], content_type: Option<&str>) -> Result<T, DecodeError>
where
    T: DeserializeOwned + Validate,
{
    let value: T = decode(body, content_type)?;
    value.validate()?;
    Ok(value)
}
