// src/dedup.rs
//! Content identity for deduplication: a stable digest per article plus the
//! process-wide memory of digests already evaluated.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};

use crate::ingest::types::Article;

/// Digest of the fields that identify an article for dedup purposes.
/// Mutable fields (summary, link) are excluded: an edited message keeps
/// its original identity.
pub fn fingerprint(article: &Article) -> String {
    let mut hasher = Sha256::new();
    hasher.update(article.title.as_bytes());
    hasher.update(article.id.to_string().as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for b in digest.iter() {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Process-wide set of fingerprints already evaluated, relevant or not.
/// Inserts are monotone; the set is never pruned for the process lifetime.
#[derive(Clone, Default)]
pub struct SeenSet {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fingerprint. Returns `true` if it was not seen before.
    pub fn insert(&self, fp: &str) -> bool {
        let mut guard = self.inner.lock().expect("seen set poisoned");
        guard.insert(fp.to_string())
    }

    pub fn contains(&self, fp: &str) -> bool {
        let guard = self.inner.lock().expect("seen set poisoned");
        guard.contains(fp)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("seen set poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
