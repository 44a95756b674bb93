// Filesystem type detection
// Mount table first (gives FUSE subtypes like "fuse.s3fs"), statfs magic second
use std::path::{Path, PathBuf};
use tracing::debug;

use lockprobe_core::port::{FilesystemInspector, UNKNOWN_FILESYSTEM};

const PROC_MOUNTS: &str = "/proc/self/mounts";

/// Filesystem inspector backed by the kernel mount table
pub struct MountTableInspector {
    mounts_path: PathBuf,
}

impl MountTableInspector {
    pub fn new(mounts_path: impl Into<PathBuf>) -> Self {
        Self {
            mounts_path: mounts_path.into(),
        }
    }
}

impl Default for MountTableInspector {
    fn default() -> Self {
        Self::new(PROC_MOUNTS)
    }
}

impl FilesystemInspector for MountTableInspector {
    fn filesystem_type(&self, path: &Path) -> String {
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if let Ok(table) = std::fs::read_to_string(&self.mounts_path) {
            if let Some(fs_type) = fs_type_from_mounts(&table, &path) {
                return fs_type;
            }
        }

        match statfs_label(&path) {
            Some(label) => label,
            None => {
                debug!(path = %path.display(), "Filesystem type not detected");
                UNKNOWN_FILESYSTEM.to_string()
            }
        }
    }
}

/// Undo the octal escapes the kernel uses in mount points (`\040` = space)
fn unescape_mount_field(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            let digits = std::str::from_utf8(&bytes[i + 1..i + 4]).unwrap_or("");
            if let Ok(value) = u8::from_str_radix(digits, 8) {
                out.push(value);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Type of the mount with the longest mount point containing `path`
///
/// Later lines win ties, matching how stacked mounts shadow earlier ones.
pub fn fs_type_from_mounts(table: &str, path: &Path) -> Option<String> {
    let mut best: Option<(usize, String)> = None;

    for line in table.lines() {
        let mut fields = line.split_whitespace();
        let (Some(_device), Some(mount_point), Some(fs_type)) =
            (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };

        let mount_point = PathBuf::from(unescape_mount_field(mount_point));
        if !path.starts_with(&mount_point) {
            continue;
        }

        let depth = mount_point.components().count();
        if best.as_ref().map_or(true, |(best_depth, _)| depth >= *best_depth) {
            best = Some((depth, fs_type.to_string()));
        }
    }

    best.map(|(_, fs_type)| fs_type)
}

/// Well-known statfs f_type magic numbers
const FS_MAGIC: &[(i64, &str)] = &[
    (0xEF53, "ext4"),
    (0x5846_5342, "xfs"),
    (0x9123_683E, "btrfs"),
    (0x0102_1994, "tmpfs"),
    (0x6969, "nfs"),
    (0x6573_5546, "fuse"),
    (0x794C_7630, "overlay"),
    (0xFF53_4D42, "cifs"),
    (0xFE53_4D42, "smb2"),
    (0x2FC1_2FC1, "zfs"),
    (0x00C3_6400, "ceph"),
    (0x0102_1997, "9p"),
];

fn magic_name(magic: i64) -> Option<&'static str> {
    FS_MAGIC
        .iter()
        .find(|(known, _)| *known == magic)
        .map(|(_, name)| *name)
}

#[cfg(target_os = "linux")]
fn statfs_label(path: &Path) -> Option<String> {
    let stat = nix::sys::statfs::statfs(path).ok()?;
    let magic = stat.filesystem_type().0 as i64;
    Some(
        magic_name(magic)
            .map(str::to_string)
            .unwrap_or_else(|| format!("0x{:x}", magic)),
    )
}

#[cfg(not(target_os = "linux"))]
fn statfs_label(_path: &Path) -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOUNTS: &str = "\
/dev/sda1 / ext4 rw,relatime 0 0
proc /proc proc rw,nosuid 0 0
tmpfs /tmp tmpfs rw 0 0
s3fs /mnt/bucket fuse.s3fs rw,nosuid 0 0
server:/export /mnt/bucket/nfs\\040share nfs4 rw 0 0
";

    #[test]
    fn test_longest_mount_point_wins() {
        assert_eq!(
            fs_type_from_mounts(MOUNTS, Path::new("/mnt/bucket/data")).as_deref(),
            Some("fuse.s3fs")
        );
        assert_eq!(
            fs_type_from_mounts(MOUNTS, Path::new("/home/user")).as_deref(),
            Some("ext4")
        );
        assert_eq!(
            fs_type_from_mounts(MOUNTS, Path::new("/tmp")).as_deref(),
            Some("tmpfs")
        );
    }

    #[test]
    fn test_escaped_mount_points() {
        assert_eq!(
            fs_type_from_mounts(MOUNTS, Path::new("/mnt/bucket/nfs share/x")).as_deref(),
            Some("nfs4")
        );
        assert_eq!(unescape_mount_field("a\\040b"), "a b");
    }

    #[test]
    fn test_prefix_is_component_wise() {
        // "/tmpdata" is not under "/tmp"
        assert_eq!(
            fs_type_from_mounts(MOUNTS, Path::new("/tmpdata")).as_deref(),
            Some("ext4")
        );
    }

    #[test]
    fn test_later_mount_shadows_earlier() {
        let table = "a /data ext4 rw 0 0\nb /data xfs rw 0 0\n";
        assert_eq!(
            fs_type_from_mounts(table, Path::new("/data/x")).as_deref(),
            Some("xfs")
        );
    }

    #[test]
    fn test_missing_mount_table_falls_back() {
        let inspector = MountTableInspector::new("/nonexistent/mounts");
        let label = inspector.filesystem_type(Path::new("/"));
        assert!(!label.is_empty());
    }

    #[test]
    fn test_magic_names() {
        assert_eq!(magic_name(0xEF53), Some("ext4"));
        assert_eq!(magic_name(0x1234), None);
    }
}
