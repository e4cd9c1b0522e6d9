//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - reference data (`EntityInfo`, `SourceIndicator`, `DerivedIndicator`)
//! - row shapes before and after cleaning (`RawRow`, `CleanRow`)
//! - run configuration (`PipelineConfig`, `YearWindow`)

pub mod types;

pub use types::*;
