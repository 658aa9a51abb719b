use std::fmt;

use sha2::{Digest, Sha256};

use super::ClassificationRequest;

/// Stable cache key over document content and classification context.
/// Identical content classified against a different category set or tier
/// floor must not collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of_request(request: &ClassificationRequest) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(&request.image_png);
        hasher.update([0u8]);
        hasher.update(request.text.as_bytes());
        hasher.update([0u8]);

        let mut categories: Vec<&str> = request
            .allowed_categories
            .iter()
            .map(String::as_str)
            .collect();
        categories.sort_unstable();
        for category in categories {
            hasher.update(category.as_bytes());
            hasher.update([0u8]);
        }

        hasher.update([request.tier_floor.rank()]);

        let digest = hasher.finalize();
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest {
            use fmt::Write as _;
            let _ = write!(hex, "{byte:02x}");
        }
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
