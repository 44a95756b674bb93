//! lockprobe CLI support shared by the `lockprobe`, `lockprobe-holder` and
//! `lockprobe-fixture` binaries

pub mod config;
pub mod logging;
pub mod output;
