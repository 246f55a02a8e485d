//! Helpers for `data:<mime>;base64,<payload>` strings.

use crate::error::{Result, StudioError};
use base64::{
    alphabet,
    engine::{general_purpose::STANDARD, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};

pub const DEFAULT_EXTENSION: &str = "png";

/// Standard alphabet that accepts payloads with or without `=` padding.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A borrowed view of a parsed data URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataUrl<'a> {
    pub mime_type: Option<&'a str>,
    pub is_base64: bool,
    pub payload: &'a str,
}

impl<'a> DataUrl<'a> {
    pub fn parse(input: &'a str) -> Option<Self> {
        let rest = input.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;

        let mut params = header.split(';');
        let mime_type = params.next().filter(|m| !m.is_empty());
        let is_base64 = params.any(|p| p.eq_ignore_ascii_case("base64"));

        Some(Self {
            mime_type,
            is_base64,
            payload,
        })
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        if !self.is_base64 {
            return Ok(self.payload.as_bytes().to_vec());
        }
        decode_base64(self.payload)
    }
}

pub fn is_data_url(input: &str) -> bool {
    input.starts_with("data:")
}

pub fn is_http_url(input: &str) -> bool {
    input.starts_with("http")
}

/// Builds `data:<mime>;base64,<payload>` from an already-encoded payload.
pub fn wrap_base64(mime_type: &str, payload: &str) -> String {
    format!("data:{};base64,{}", mime_type, payload)
}

pub fn encode(mime_type: &str, bytes: &[u8]) -> String {
    wrap_base64(mime_type, &STANDARD.encode(bytes))
}

pub fn decode_base64(payload: &str) -> Result<Vec<u8>> {
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    LENIENT
        .decode(cleaned.as_bytes())
        .map_err(|e| StudioError::DecodeError(format!("Invalid base64 payload: {}", e)))
}

/// Extension taken from a `data:image/<ext>;base64,` prefix. Anything else
/// (missing MIME, non-image MIME, non-word subtype) yields `png`.
pub fn image_extension(input: &str) -> &str {
    let Some(rest) = input.strip_prefix("data:image/") else {
        return DEFAULT_EXTENSION;
    };
    let Some((subtype, _)) = rest.split_once(";base64,") else {
        return DEFAULT_EXTENSION;
    };
    let is_word = !subtype.is_empty()
        && subtype
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if is_word {
        subtype
    } else {
        DEFAULT_EXTENSION
    }
}

/// Returns the raw base64 payload whether or not a data-URL header is present.
pub fn base64_payload(input: &str) -> &str {
    match DataUrl::parse(input) {
        Some(parsed) => parsed.payload,
        None => input,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mime_and_payload() {
        let parsed = DataUrl::parse("data:image/webp;base64,AAAA").unwrap();
        assert_eq!(parsed.mime_type, Some("image/webp"));
        assert!(parsed.is_base64);
        assert_eq!(parsed.payload, "AAAA");
    }

    #[test]
    fn rejects_strings_without_scheme_or_comma() {
        assert!(DataUrl::parse("image/png;base64,AAAA").is_none());
        assert!(DataUrl::parse("data:image/png;base64").is_none());
    }

    #[test]
    fn extension_defaults_to_png_when_mime_is_absent() {
        assert_eq!(image_extension("data:;base64,aGVsbG8="), "png");
        assert_eq!(image_extension("aGVsbG8="), "png");
        assert_eq!(image_extension("data:image/svg+xml;base64,PHN2Zz4="), "png");
        assert_eq!(image_extension("data:image/jpeg;base64,/9j/"), "jpeg");
    }

    #[test]
    fn encode_then_parse_gives_original_bytes() {
        let url = encode("image/png", b"\x89PNG");
        let parsed = DataUrl::parse(&url).unwrap();
        assert_eq!(parsed.decode().unwrap(), b"\x89PNG");
    }

    #[test]
    fn base64_payload_accepts_bare_base64() {
        assert_eq!(base64_payload("aGVsbG8="), "aGVsbG8=");
        assert_eq!(base64_payload("data:image/png;base64,aGVsbG8="), "aGVsbG8=");
    }

    #[test]
    fn padding_is_optional_when_decoding() {
        assert_eq!(decode_base64("aGVsbG8").unwrap(), b"hello");
        assert_eq!(decode_base64("aGVsbG8=").unwrap(), b"hello");
        assert_eq!(decode_base64("aGVs\nbG8").unwrap(), b"hello");
        assert!(matches!(
            decode_base64("a!b"),
            Err(StudioError::DecodeError(_))
        ));
    }
}
