//! Storage domain - Persistence abstraction for experiment tests

mod entity;
mod repository;

pub use entity::{StorageEntity, StorageKey};
pub use repository::Storage;
