//! CLI subcommand implementations

pub mod alert;
pub mod diagnose;
pub mod disks;
pub mod root_cause;
pub mod samples;
pub mod topology;
