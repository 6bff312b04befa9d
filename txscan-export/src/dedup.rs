//! Cross-page, cross-category duplicate suppression.

use std::collections::HashSet;

use txscan::{IdentityKey, UnifiedRecord};

/// Admits each [`IdentityKey`] at most once per run.
///
/// The same hash may still be admitted several times under a different
/// category or token ID (one external transfer plus several NFT transfers
/// of the same transaction).
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<IdentityKey>,
}

impl Deduplicator {
    /// An empty deduplicator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `record`'s identity; `true` if it was not seen before.
    pub fn admit(&mut self, record: &UnifiedRecord) -> bool {
        self.seen.insert(record.identity_key())
    }

    /// Number of distinct identities admitted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether nothing has been admitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
