pub mod data_loader;
pub mod food_search;
pub mod sheet_cache;

pub use data_loader::{load_sheet_rows, parse_sheet_csv, SheetRow};
pub use food_search::{DataQualityTier, FoodCandidate, FoodSearch};
pub use sheet_cache::{CachedSheet, SheetSource, StaticSheet, DEFAULT_SHEET_RETRY, DEFAULT_SHEET_TTL};
