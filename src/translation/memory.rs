/*!
 * Bounded conversational memory for stateful engines.
 *
 * Messages alternate request / response. The log keeps at most `2 * offset`
 * messages and always evicts from the oldest end two at a time, so a request
 * is never separated from its response.
 */

/// Fixed-capacity log of prior exchanges
#[derive(Debug, Clone)]
pub struct ContextMemory<T> {
    messages: Vec<T>,
    capacity: usize,
}

impl<T> ContextMemory<T> {
    /// Create a memory remembering `offset` request/response pairs
    ///
    /// An offset of zero is raised to one so the latest exchange is kept.
    pub fn new(offset: usize) -> Self {
        let offset = offset.max(1);
        Self {
            messages: Vec::with_capacity(offset * 2 + 1),
            capacity: offset * 2,
        }
    }

    /// Append one message, evicting the oldest pair on overflow
    pub fn append(&mut self, message: T) {
        self.messages.push(message);
        if self.messages.len() > self.capacity {
            let evict = self.messages.len().min(2);
            self.messages.drain(..evict);
        }
    }

    /// Messages currently remembered, oldest first
    pub fn snapshot(&self) -> &[T] {
        &self.messages
    }

    /// Number of stored messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Maximum number of stored messages
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
