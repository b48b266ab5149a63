//! Component monitor agent
//!
//! Configuration loading and the HTTP API served by the `component-monitor`
//! binary.

pub mod api;
pub mod config;
