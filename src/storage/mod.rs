//! Object storage clients.

pub mod r2;

pub use r2::{ObjectStorage, StorageError, UploadResult};
