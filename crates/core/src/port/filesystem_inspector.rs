// Filesystem Inspector Port

use std::path::Path;

/// Label used when the filesystem type cannot be determined
pub const UNKNOWN_FILESYSTEM: &str = "unknown";

/// Resolves the filesystem type backing a path
pub trait FilesystemInspector: Send + Sync {
    /// Filesystem type label (e.g. "ext4", "nfs4", "fuse.s3fs")
    ///
    /// Never fails; returns UNKNOWN_FILESYSTEM when detection is impossible.
    fn filesystem_type(&self, path: &Path) -> String;
}

pub mod mocks {
    use super::*;

    /// Mock inspector returning a fixed label
    pub struct FixedFilesystemInspector(pub String);

    impl FixedFilesystemInspector {
        pub fn new(label: impl Into<String>) -> Self {
            Self(label.into())
        }
    }

    impl FilesystemInspector for FixedFilesystemInspector {
        fn filesystem_type(&self, _path: &Path) -> String {
            self.0.clone()
        }
    }
}
