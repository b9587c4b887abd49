use super::Message;

/// Per-millisecond message index for one loaded race.
///
/// One bucket per millisecond from 0 to the race's total time inclusive, each
/// holding its messages in file order. O(1) lookup by timestamp traded
/// against one (usually empty) vec per millisecond. Built once per load and
/// replaced wholesale on the next one, never mutated element-wise.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Timeline {
    buckets: Vec<Vec<Message>>,
}

impl Timeline {
    /// Builds an empty timeline able to hold every millisecond of a race
    /// lasting `total_time_ms`.
    pub fn with_total_time(total_time_ms: u32) -> Self {
        Self {
            buckets: vec![Vec::new(); total_time_ms as usize + 1],
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Appends a message to the bucket matching its timestamp. The validator
    /// guarantees the timestamp fits before calling.
    pub(crate) fn push(&mut self, message: Message) {
        let bucket = message.timestamp_ms() as usize;
        self.buckets[bucket].push(message);
    }

    pub fn bucket(&self, time_ms: u32) -> &[Message] {
        &self.buckets[time_ms as usize]
    }

    /// Iterates every message stamped in `[from_ms, to_ms)` in
    /// time-then-file order.
    pub fn range(&self, from_ms: u32, to_ms: u32) -> impl Iterator<Item = &Message> {
        self.buckets[from_ms as usize..to_ms as usize]
            .iter()
            .flatten()
    }

    pub fn message_count(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }
}
