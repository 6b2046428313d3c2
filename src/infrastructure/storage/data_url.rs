use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::StorageError;

static DATA_URL_META: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"^data:(.+);base64$"));

/// Payload extracted from a `data:` URL.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedDataUrl {
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

pub fn is_data_url(value: &str) -> bool {
    value.starts_with("data:")
}

pub fn parse_data_url(url: &str) -> Result<DecodedDataUrl, StorageError> {
    let (meta, payload) = url
        .split_once(',')
        .ok_or_else(|| StorageError::InvalidSource("data URL has no payload".into()))?;

    let pattern = DATA_URL_META
        .as_ref()
        .map_err(|e| StorageError::Backend(e.to_string()))?;

    let content_type = pattern
        .captures(meta)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    if content_type.is_none() && !meta.ends_with(";base64") {
        return Err(StorageError::InvalidSource("only base64 data URLs are supported".into()));
    }

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| StorageError::InvalidSource(format!("invalid base64 payload: {e}")))?;

    Ok(DecodedDataUrl { content_type, bytes: Bytes::from(bytes) })
}

pub fn to_data_url(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", content_type, STANDARD.encode(bytes))
}

/// File extension for a MIME type: the subtype without parameters.
pub fn extension_for(content_type: &str) -> Option<&str> {
    content_type
        .split(';')
        .next()
        .and_then(|mime| mime.split_once('/'))
        .map(|(_, subtype)| subtype.trim())
        .filter(|subtype| !subtype.is_empty())
}
