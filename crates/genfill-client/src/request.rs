//! Inpainting request payload.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;

/// JSON body of `POST /api/v1/inpaint`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InpaintRequest {
    /// Base64 of the cropped image PNG.
    pub image: String,
    /// Base64 of the mask PNG.
    pub mask: String,
}

impl InpaintRequest {
    /// Encode raw PNG bytes with standard, padded base64.
    #[must_use]
    pub fn from_png(image: &[u8], mask: &[u8]) -> Self {
        Self {
            image: STANDARD.encode(image),
            mask: STANDARD.encode(mask),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_both_payloads_with_padding() -> Result<(), serde_json::Error> {
        let request = InpaintRequest::from_png(b"\x89PNG", b"m");
        assert_eq!(request.image, "iVBORw==");
        assert_eq!(request.mask, "bQ==");
        assert_eq!(
            serde_json::to_string(&request)?,
            r#"{"image":"iVBORw==","mask":"bQ=="}"#
        );
        Ok(())
    }
}
