//! Download progress reporting

use lineage_core::HashKey;

/// Observes bytes arriving for a key
///
/// Called once per received chunk with the running total and the
/// `Content-Length`, when the server sent one.
pub trait ProgressListener: Send + Sync {
    fn on_progress(&self, key: &HashKey, received: u64, total: Option<u64>);
}

impl<F> ProgressListener for F
where
    F: Fn(&HashKey, u64, Option<u64>) + Send + Sync,
{
    fn on_progress(&self, key: &HashKey, received: u64, total: Option<u64>) {
        self(key, received, total)
    }
}
