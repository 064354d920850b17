pub mod array_file;
pub mod codec;
pub mod error;

pub use array_file::{ArrayFileStore, StoreGuard, EMPTY_ARRAY};
pub use error::{Result, StoreError};
