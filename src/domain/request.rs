use std::collections::BTreeMap;

use super::QualityTier;

/// Metadata describing the source document, supplied by the content
/// extraction collaborator alongside the rendered page image.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMetadata {
    pub filename: String,
    pub file_type: String,
    pub size_bytes: u64,
    pub page_count: u32,
    /// Extractor-specific fields (sheet names, image dimensions, ...).
    pub extra: BTreeMap<String, String>,
}

impl DocumentMetadata {
    pub fn new(filename: impl Into<String>, file_type: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            filename: filename.into(),
            file_type: file_type.into(),
            size_bytes,
            page_count: 1,
            extra: BTreeMap::new(),
        }
    }
}

/// One classification job. Built once per inbound document and never
/// mutated; providers, cache, and dispatcher all read the same value.
#[derive(Debug, Clone)]
pub struct ClassificationRequest {
    /// Rendered visual representation (PNG) of the document's first page.
    pub image_png: Vec<u8>,
    /// Extracted text, possibly empty for image-only documents.
    pub text: String,
    pub metadata: DocumentMetadata,
    /// Labels the caller will accept, in addition to the reserved sentinels.
    pub allowed_categories: Vec<String>,
    /// Providers below this tier are never considered for this request.
    pub tier_floor: QualityTier,
}

impl ClassificationRequest {
    pub fn new(
        image_png: Vec<u8>,
        text: String,
        metadata: DocumentMetadata,
        allowed_categories: Vec<String>,
    ) -> Self {
        Self {
            image_png,
            text,
            metadata,
            allowed_categories,
            tier_floor: QualityTier::new(0),
        }
    }

    pub fn with_tier_floor(mut self, floor: QualityTier) -> Self {
        self.tier_floor = floor;
        self
    }

    pub fn allows_label(&self, label: &str) -> bool {
        self.allowed_categories.iter().any(|c| c == label)
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}
