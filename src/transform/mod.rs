//! Table transformations: cleaning, localization, derived indicators.

pub mod clean;
pub mod derive;
pub mod locale;

pub use clean::Cleaner;
pub use derive::{WideTable, add_derived};
pub use locale::Localizer;
