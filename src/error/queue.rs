//! Bounded FIFO of formatted error entries.

use arraydeque::ArrayDeque;

use super::{codes, format_entry, standard_message, ErrorEntry, UNKNOWN_ERROR};

/// Depth of the error/event queue.
pub const ERROR_QUEUE_DEPTH: usize = 4;

/// The error/event queue. When full, the newest slot is sacrificed for a
/// `-350,"Queue overflow"` marker and incoming errors are dropped until the
/// controller drains the queue.
pub struct ErrorQueue {
    entries: ArrayDeque<ErrorEntry, ERROR_QUEUE_DEPTH>,
}

impl ErrorQueue {
    pub(crate) fn new() -> Self {
        ErrorQueue {
            entries: ArrayDeque::new(),
        }
    }

    /// Queue a formatted entry; returns the code actually stored, which differs
    /// from `code` only when the overflow substitution kicked in.
    pub(crate) fn push(&mut self, code: i16, entry: ErrorEntry) -> i16 {
        if self.entries.push_back(entry).is_err() {
            self.entries.pop_back();
            let message = standard_message(codes::QUEUE_OVERFLOW).unwrap_or(UNKNOWN_ERROR);
            let _ = self
                .entries
                .push_back(format_entry(codes::QUEUE_OVERFLOW, message, b""));
            codes::QUEUE_OVERFLOW
        } else {
            code
        }
    }

    pub(crate) fn pop(&mut self) -> Option<ErrorEntry> {
        self.entries.pop_front()
    }

    pub(crate) fn front(&self) -> Option<&ErrorEntry> {
        self.entries.front()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
