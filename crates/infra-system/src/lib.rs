// lockprobe Infrastructure - System Adapters
// Implements: LockBackend, ConflictHolder, FilesystemInspector

pub mod holder;
pub mod mount_inspector;
#[cfg(unix)]
pub mod nix_lock_backend;
pub mod process_holder;

pub use holder::{hold_exclusive, HoldOutcome};
pub use mount_inspector::MountTableInspector;
#[cfg(unix)]
pub use nix_lock_backend::NixLockBackend;
pub use process_holder::ProcessConflictHolder;
