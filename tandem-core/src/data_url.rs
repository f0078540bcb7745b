//! `data:` URL conversion.
//!
//! Pickers hand images back as `data:<mime>;base64,<payload>`; storage wants
//! raw bytes. Both directions are pure and allocation-only.

use base64::alphabet;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use tandem_model::RawBinary;
use thiserror::Error;

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64";

/// Accepts payloads with or without `=` padding, as browsers' `atob` does.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("data URL must start with `data:`")]
    MissingScheme,

    #[error("data URL has no `,` between header and payload")]
    MissingPayloadSeparator,

    #[error("data URL header has no MIME type")]
    MissingMime,

    #[error("data URL payload is not base64 encoded")]
    NotBase64,

    #[error("invalid base64 payload: {0}")]
    InvalidPayload(#[from] base64::DecodeError),
}

/// Decode a base64 data-URL into its MIME type and bytes.
pub fn decode(data_url: &str) -> Result<RawBinary, EncodingError> {
    let rest = data_url
        .strip_prefix(SCHEME)
        .ok_or(EncodingError::MissingScheme)?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or(EncodingError::MissingPayloadSeparator)?;

    // Parameters such as `;charset=` may sit between the MIME type and the
    // base64 marker, which is always last.
    let params = header
        .strip_suffix(BASE64_MARKER)
        .ok_or(EncodingError::NotBase64)?;
    let mime = params.split(';').next().unwrap_or_default().trim();
    if mime.is_empty() {
        return Err(EncodingError::MissingMime);
    }

    // Line-wrapped payloads are common in pasted or e-mailed data-URLs.
    let compact: Vec<u8> = payload
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let bytes = LENIENT.decode(compact)?;
    Ok(RawBinary::new(mime, bytes))
}

/// Inverse of [`decode`].
pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!("{SCHEME}{mime}{BASE64_MARKER},{}", BASE64_STANDARD.encode(bytes))
}
