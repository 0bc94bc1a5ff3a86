// src/services/sink.rs

//! Append-only result collection shared by fan-out tasks.

use std::sync::{Arc, Mutex, PoisonError};

/// A cloneable handle to one mutex-guarded `Vec`.
///
/// Appends are linearizable; insertion order is whatever the tasks race to.
#[derive(Debug)]
pub struct ResultSink<T> {
    items: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for ResultSink<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<T> Default for ResultSink<T> {
    fn default() -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T> ResultSink<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, item: T) {
        // Vec::push never leaves a partial element, so poisoning is ignored.
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(item);
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take everything collected so far, leaving the sink empty.
    pub fn drain(&self) -> Vec<T> {
        std::mem::take(&mut *self.items.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
