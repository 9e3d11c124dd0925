//! Drawing payload decoding.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use crate::error::{ServiceError, ServiceResult};

/// Standard alphabet, padding optional. Canvas exports are padded, hand-made
/// payloads often are not.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a drawing sent as plain base64 or as a `data:<mime>;base64,` URL.
pub fn decode_drawing_data(data: &str) -> ServiceResult<Vec<u8>> {
    let data = data.trim();
    let encoded = match data.strip_prefix("data:") {
        Some(url) => {
            let (header, body) = url
                .split_once(',')
                .ok_or_else(|| ServiceError::Input("drawingData data URL has no payload".into()))?;
            if !header.ends_with(";base64") {
                return Err(ServiceError::Input(
                    "drawingData data URL must be base64 encoded".into(),
                ));
            }
            body
        }
        None => data,
    };

    // Whitespace inside the payload survives some form encoders.
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(ServiceError::Input("drawingData is empty".into()));
    }
    LENIENT
        .decode(compact.as_bytes())
        .map_err(|e| ServiceError::Input(format!("drawingData is not valid base64: {e}")))
}
