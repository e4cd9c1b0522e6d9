//! Remote data acquisition (World Bank v2 API).

pub mod fetch;
pub mod worldbank;

pub use fetch::{HttpTransport, Pager, Transport};
pub use worldbank::{fetch_indicator_rows, normalize, resolve_entities};
