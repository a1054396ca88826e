//! # topcolors
//!
//! Finds the three most frequent colors of every image in a list of URLs.
//!
//! URLs are fingerprinted, checked against a process-lifetime dedup cache,
//! and the misses are fetched, decoded and counted by a fixed-size worker
//! pool. Reports come out in completion order, one per input URL.

pub mod analysis;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod io;
pub mod model;
pub mod telemetry;
