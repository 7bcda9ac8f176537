//! Interfaces to the opaque remote helper services.
//!
//! Geocoding and AI image generation are external collaborators: they take a
//! free-text prompt or a coordinate pair and return text or an inline image
//! payload. They must never be able to crash the mutation path, so the
//! convenience wrappers here catch every failure and degrade to a non-fatal
//! user-facing message.

use tracing::warn;

/// Failure from a helper service. Always recoverable.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ServiceError(pub String);

/// An inline image payload as returned by the image service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Turns a coordinate pair into a human-readable address.
pub trait Geocoder: Send + Sync {
    fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<String, ServiceError>;
}

/// Generates an image from a free-text prompt.
pub trait ImageGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<ImagePayload, ServiceError>;
}

/// Resolve coordinates to an address, falling back to a plain coordinate
/// string when the service fails. The fallback doubles as the user-facing
/// message, so callers can use the result unconditionally.
pub fn resolve_address(geocoder: &dyn Geocoder, latitude: f64, longitude: f64) -> String {
    match geocoder.reverse_geocode(latitude, longitude) {
        Ok(address) => address,
        Err(e) => {
            warn!("reverse geocoding failed: {e}");
            format!("Near {latitude:.5}, {longitude:.5} (address lookup unavailable)")
        }
    }
}

/// Generate an image for a prompt, returning `None` on failure instead of
/// propagating the error.
pub fn generate_image(generator: &dyn ImageGenerator, prompt: &str) -> Option<ImagePayload> {
    match generator.generate(prompt) {
        Ok(payload) => Some(payload),
        Err(e) => {
            warn!(prompt, "image generation failed: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedGeocoder(Option<String>);

    impl Geocoder for FixedGeocoder {
        fn reverse_geocode(&self, _lat: f64, _lon: f64) -> Result<String, ServiceError> {
            self.0
                .clone()
                .ok_or_else(|| ServiceError("upstream timeout".to_string()))
        }
    }

    struct BrokenImages;

    impl ImageGenerator for BrokenImages {
        fn generate(&self, _prompt: &str) -> Result<ImagePayload, ServiceError> {
            Err(ServiceError("quota exceeded".to_string()))
        }
    }

    #[test]
    fn resolve_address_passes_through_success() {
        let geocoder = FixedGeocoder(Some("House 12, Block F, Karachi".to_string()));
        assert_eq!(
            resolve_address(&geocoder, 24.86, 67.01),
            "House 12, Block F, Karachi"
        );
    }

    #[test]
    fn resolve_address_degrades_to_coordinates_on_failure() {
        let geocoder = FixedGeocoder(None);
        let fallback = resolve_address(&geocoder, 24.86, 67.01);
        assert!(fallback.contains("24.86000"));
        assert!(fallback.contains("address lookup unavailable"));
    }

    #[test]
    fn image_failures_become_none() {
        assert!(generate_image(&BrokenImages, "biryani plate").is_none());
    }
}
