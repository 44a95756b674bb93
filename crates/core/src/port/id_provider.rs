// ID Provider Port (for deterministic testing)

/// ID provider interface (allows deterministic scratch-file names in tests)
pub trait IdProvider: Send + Sync {
    /// Generate a new unique ID
    fn generate_id(&self) -> String;
}

/// UUID v4 provider (production)
pub struct UuidProvider;

impl IdProvider for UuidProvider {
    fn generate_id(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Sequential IDs: "run-0", "run-1", ...
    #[derive(Default)]
    pub struct SequentialIdProvider {
        next: AtomicUsize,
    }

    impl IdProvider for SequentialIdProvider {
        fn generate_id(&self) -> String {
            format!("run-{}", self.next.fetch_add(1, Ordering::SeqCst))
        }
    }
}
