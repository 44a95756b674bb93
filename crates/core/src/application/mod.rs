// Application Layer - Use Cases

pub mod constants;
pub mod fixture;
pub mod probe;
mod shutdown;

// Re-exports
pub use fixture::{FixtureConfig, FixtureMode, FixtureSummary, LogFixture};
pub use probe::{LockProber, ProbeConfig};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
