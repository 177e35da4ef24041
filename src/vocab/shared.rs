//! Vocabulary shared between threads. Growth goes through the write lock, so concurrent
//! collation calls can never hand one id to two tokens.

use super::{TokenId, Vocabulary};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone, Default)]
pub struct SharedVocabulary {
    inner: Arc<RwLock<Vocabulary>>,
}

impl SharedVocabulary {
    pub fn new(vocab: Vocabulary) -> Self {
        Self {
            inner: Arc::new(RwLock::new(vocab)),
        }
    }

    // The mapping is append-only, so a panic mid-insert cannot leave it inconsistent;
    // a poisoned lock is simply recovered.
    pub fn read(&self) -> RwLockReadGuard<'_, Vocabulary> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Vocabulary> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn assign_or_lookup(&self, token: Option<&str>, grow: bool) -> TokenId {
        if grow {
            self.write().assign_or_lookup(token, true)
        } else {
            token.map(|t| self.read().lookup(t)).unwrap_or(super::UNK_ID)
        }
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Both handles refer to the same vocabulary
    pub fn same_as(&self, other: &SharedVocabulary) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Address of the shared state, used to take several write locks in a fixed order
    pub(crate) fn lock_order(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    /// Point-in-time copy
    pub fn snapshot(&self) -> Vocabulary {
        self.read().clone()
    }
}
