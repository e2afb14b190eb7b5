use crate::models::JudgmentTuple;

/// Collects judgment tuples until a configured batch size is reached.
///
/// Exists only for the duration of one dispatch cycle; `drain` hands the
/// contents over in insertion order and resets the accumulator.
#[derive(Debug)]
pub struct BatchAccumulator {
    items: Vec<JudgmentTuple>,
    batch_size: usize,
}

impl BatchAccumulator {
    pub fn new(batch_size: usize) -> Self {
        Self {
            items: Vec::with_capacity(batch_size),
            batch_size,
        }
    }

    pub fn push(&mut self, tuple: JudgmentTuple) {
        self.items.push(tuple);
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.batch_size
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Return the accumulated tuples and clear the accumulator
    pub fn drain(&mut self) -> Vec<JudgmentTuple> {
        std::mem::take(&mut self.items)
    }
}
