pub mod intent;
pub mod models;
pub mod temporal;

pub use intent::{classify, classify_at, matched_trigger};
pub use models::*;
pub use temporal::extract_datetime_at;
