//! In-memory store for generated images.
//!
//! Images live only as long as the process, and at most `capacity` of them
//! at a time; inserting past that drops the oldest. Ids are unique per
//! process and carry the file extension, so `<id>.png` and `<id>.gif`
//! requests can be told apart before the lookup.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use bytes::Bytes;
use dashmap::DashMap;
use tracing::debug;

use crate::config::DEFAULT_IMAGE_CAPACITY;

/// Encoded image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Gif,
}

impl ImageKind {
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Gif => "image/gif",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Gif => "gif",
        }
    }
}

/// A stored image with its format.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub kind: ImageKind,
    pub bytes: Bytes,
}

/// Concurrent id → image map with FIFO eviction.
#[derive(Debug)]
pub struct ImageStore {
    images: DashMap<String, StoredImage>,
    /// Insertion order, oldest first.
    order: Mutex<VecDeque<String>>,
    capacity: usize,
    next_id: AtomicU64,
}

impl Default for ImageStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_IMAGE_CAPACITY)
    }
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that keeps at most `capacity` images (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            images: DashMap::new(),
            order: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            next_id: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stores an image and returns its id, e.g. `satellite-78701-3.png`.
    pub fn insert(&self, stem: &str, kind: ImageKind, bytes: impl Into<Bytes>) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        let id = format!("{}-{}.{}", slug(stem), n, kind.extension());

        // Held across both maps so order and images never disagree.
        let mut order = self.order.lock().unwrap_or_else(PoisonError::into_inner);
        self.images.insert(
            id.clone(),
            StoredImage {
                kind,
                bytes: bytes.into(),
            },
        );
        order.push_back(id.clone());
        while order.len() > self.capacity {
            if let Some(oldest) = order.pop_front() {
                self.images.remove(&oldest);
                debug!(id = %oldest, "Evicted image");
            }
        }
        id
    }

    pub fn get(&self, id: &str) -> Option<StoredImage> {
        self.images.get(id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Lowercase ASCII letters and digits, everything else collapsed to `-`.
fn slug(stem: &str) -> String {
    let mut out = String::with_capacity(stem.len());
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}
