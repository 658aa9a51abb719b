use crate::domain::{ClassificationResult, Fingerprint};

/// Result cache keyed by content fingerprint. Lookups and stores are
/// synchronous by contract: implementations must complete in bounded,
/// small time and never suspend. Concurrent writes to the same key may
/// race; last write wins.
pub trait ResultCache: Send + Sync {
    fn get(&self, key: &Fingerprint) -> Option<ClassificationResult>;

    fn put(&self, key: Fingerprint, result: ClassificationResult);
}
