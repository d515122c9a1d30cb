//! Recently created task ids, used to resolve "last".

use std::collections::VecDeque;

use crate::domain::foundation::TaskId;

pub const RECENT_CAPACITY: usize = 20;

/// Bounded FIFO of created task ids in creation order.
#[derive(Debug, Clone)]
pub struct RecentCreatedBuffer {
    ids: VecDeque<TaskId>,
    capacity: usize,
}

impl Default for RecentCreatedBuffer {
    fn default() -> Self {
        Self::with_capacity(RECENT_CAPACITY)
    }
}

impl RecentCreatedBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ids: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends an id, dropping the oldest beyond capacity.
    pub fn push(&mut self, id: TaskId) {
        self.ids.push_back(id);
        while self.ids.len() > self.capacity {
            self.ids.pop_front();
        }
    }

    pub fn last(&self) -> Option<&TaskId> {
        self.ids.back()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskId> {
        self.ids.iter()
    }
}
