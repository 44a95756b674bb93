// Port Layer - Interfaces for external dependencies

pub mod conflict_holder;
pub mod filesystem_inspector;
pub mod id_provider; // For deterministic testing
pub mod lock_backend;
pub mod time_provider;

// Re-exports
pub use conflict_holder::{ConflictHolder, HeldLock, HolderError, HolderExit};
pub use filesystem_inspector::{FilesystemInspector, UNKNOWN_FILESYSTEM};
pub use id_provider::IdProvider;
pub use lock_backend::{ByteRange, LockBackend, LockError, LockGuard, RecordLockState, WaitMode};
pub use time_provider::TimeProvider;
