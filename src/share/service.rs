//! Share creation and lookup on top of a [`ShareStore`].

use chrono::{SubsecRound, Utc};
use rand::Rng;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use super::store::{ShareStore, StoreError};
use crate::types::{ShareRequest, SharedTweetRecord};

/// Length of generated share ids.
pub const SHARE_ID_LEN: usize = 21;
/// Longest id accepted on lookup.
pub const MAX_SHARE_ID_LEN: usize = 64;

const ID_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

#[derive(Error, Debug)]
pub enum ShareError {
    #[error("malformed share id: {0:?}")]
    InvalidId(String),
    #[error("share not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Fresh URL-safe id, 21 characters from a 64-symbol alphabet.
pub fn generate_share_id() -> String {
    let mut rng = rand::thread_rng();
    (0..SHARE_ID_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Non-empty, at most 64 characters of `[A-Za-z0-9_-]`.
pub fn is_valid_share_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SHARE_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

#[derive(Clone)]
pub struct ShareService {
    store: Arc<dyn ShareStore>,
}

impl ShareService {
    pub fn new(store: Arc<dyn ShareStore>) -> Self {
        Self { store }
    }

    /// Persist `request` under a new id and return the id.
    ///
    /// Exactly one insert. Submitting the same payload twice creates two
    /// records.
    pub fn create_share(&self, request: ShareRequest) -> Result<String, ShareError> {
        let record = SharedTweetRecord {
            id: generate_share_id(),
            images: request.images,
            restaurant_name: request.restaurant_name,
            menus: request.menus,
            satisfaction: request.satisfaction,
            variations: request.variations,
            created_at: Utc::now().trunc_subsecs(3),
        };
        self.store.insert(&record)?;
        info!(
            share_id = %record.id,
            images = record.images.len(),
            variations = record.variations.len(),
            "created share"
        );
        Ok(record.id)
    }

    pub fn get_share(&self, id: &str) -> Result<SharedTweetRecord, ShareError> {
        if !is_valid_share_id(id) {
            return Err(ShareError::InvalidId(id.to_string()));
        }
        self.store
            .get(id)?
            .ok_or_else(|| ShareError::NotFound(id.to_string()))
    }
}
