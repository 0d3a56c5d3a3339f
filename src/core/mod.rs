pub mod error;
pub mod types;

pub use error::{Result, StoreError, ValidationError};
pub use types::{EntityId, Row};
