mod models;
mod schema;
mod store;
mod trait_def;
pub mod validation;

pub use models::*;
pub use store::SqliteCaptureStore;
pub use trait_def::{CaptureStore, CaptureStoreError};
