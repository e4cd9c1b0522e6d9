//! `wb-etl` library crate.
//!
//! The binary (`wb-etl`) is a thin wrapper around this library so that:
//!
//! - every pipeline stage is testable without network access or processes
//! - stages can be reused on their own (e.g. re-validating a clean CSV)

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod plot;
pub mod quality;
pub mod report;
pub mod transform;
