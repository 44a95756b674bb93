// Probe & fixture constants (no magic values)
use std::time::Duration;

use crate::port::ByteRange;

/// How long the conflict holder keeps its lock unless released early (3s)
pub const DEFAULT_HOLD_DURATION: Duration = Duration::from_secs(3);

/// How long to wait for the holder's readiness line (10s)
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Line the holder prints once its lock is held
pub const HOLDER_READY_LINE: &str = "LOCK_ACQUIRED";

/// Prefix of the line the holder prints when its lock call fails
/// Format: `LOCK_FAILED <errno|-> <not_supported:0|1> <message>`
pub const HOLDER_FAILED_PREFIX: &str = "LOCK_FAILED";

/// Record lock placed by the record-lock phase
pub const RECORD_LOCK_RANGE: ByteRange = ByteRange { start: 0, len: 10 };

/// Overlapping range queried after the record lock is set
pub const RECORD_QUERY_RANGE: ByteRange = ByteRange { start: 0, len: 5 };

/// Scratch file name prefixes (a per-run id and ".tmp" are appended)
pub const FLOCK_SCRATCH_PREFIX: &str = ".lockprobe-flock";
pub const FCNTL_SCRATCH_PREFIX: &str = ".lockprobe-fcntl";

/// Content written into scratch files before locking
pub const SCRATCH_CONTENT: &[u8] = b"lockprobe test content\n";

/// Fixture output directory (relative to the working directory)
pub const DEFAULT_FIXTURE_DIR: &str = "output_dir";

/// Fixture log file name inside the output directory
pub const DEFAULT_FIXTURE_LOG: &str = "fixture.log";

/// Fixture run time before exiting on its own (24 hours)
pub const DEFAULT_FIXTURE_DURATION: Duration = Duration::from_secs(86_400);

/// Write-mode interval between log lines (1s)
pub const DEFAULT_FIXTURE_INTERVAL: Duration = Duration::from_millis(1000);

/// Hold-mode heartbeat interval (60s)
pub const DEFAULT_FIXTURE_HEARTBEAT: Duration = Duration::from_secs(60);

/// How long to wait for the holder to exit after its stdin is closed (5s)
/// before killing it
pub const HOLDER_RELEASE_TIMEOUT: Duration = Duration::from_secs(5);
