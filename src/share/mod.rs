//! Shared results: persistence and lookup.
//!
//! - **Store**: [`ShareStore`] trait, [`MemoryShareStore`]
//! - **SQLite**: [`SqliteShareStore`], the production store
//! - **Service**: [`ShareService`], id generation and validation

pub mod service;
pub mod sqlite;
pub mod store;

pub use service::{
    MAX_SHARE_ID_LEN, SHARE_ID_LEN, ShareError, ShareService, generate_share_id,
    is_valid_share_id,
};
pub use sqlite::SqliteShareStore;
pub use store::{MemoryShareStore, ShareStore, StoreError};
