//! FIFO of consolidation requests rejected by the guard.
//!
//! Drained when the guard is released or on a timer. A key waits at most
//! once; re-queuing an already waiting key keeps its original position.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum QueueOutcome {
    /// Zero-based position in the queue.
    Queued { position: usize },
    AlreadyQueued { position: usize },
    /// Queue at capacity; the request was dropped.
    Full,
}

#[derive(Debug, Clone)]
pub struct ConsolidationQueue {
    pending: VecDeque<String>,
    max_len: usize,
}

impl ConsolidationQueue {
    pub fn new(max_len: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            max_len,
        }
    }

    pub fn push(&mut self, key: &str) -> QueueOutcome {
        if let Some(position) = self.pending.iter().position(|k| k == key) {
            debug!(key, position, "consolidation already queued");
            return QueueOutcome::AlreadyQueued { position };
        }
        if self.pending.len() >= self.max_len {
            warn!(key, max_len = self.max_len, "consolidation queue full, dropping request");
            return QueueOutcome::Full;
        }
        self.pending.push_back(key.to_string());
        QueueOutcome::Queued {
            position: self.pending.len() - 1,
        }
    }

    pub fn pop(&mut self) -> Option<String> {
        self.pending.pop_front()
    }

    /// Put a key back at the head, e.g. when a drain attempt was blocked again.
    pub fn requeue_front(&mut self, key: String) {
        if !self.pending.contains(&key) {
            self.pending.push_front(key);
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.pending.iter().cloned().collect()
    }
}
