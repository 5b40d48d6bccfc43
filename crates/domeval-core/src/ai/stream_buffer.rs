//! Coalescing buffer for smooth snapshot emission
//!
//! Upstream deltas arrive token-by-token, far faster than a UI wants to
//! repaint. Fragments are staged per target buffer and drained in batches on
//! a bounded schedule, so the consumer callback fires at most once per
//! interval while never losing content.

use std::time::Duration;

use tokio::time::Instant;

use super::types::Target;

/// Pending fragments awaiting coalescing, plus the interval gate.
#[derive(Debug)]
pub struct StreamBuffer {
    pending_reasoning: Vec<String>,
    pending_answer: Vec<String>,
    last_flush: Instant,
    interval: Duration,
}

impl StreamBuffer {
    pub fn new(interval: Duration) -> Self {
        Self {
            pending_reasoning: Vec::new(),
            pending_answer: Vec::new(),
            last_flush: Instant::now(),
            interval,
        }
    }

    /// Stage one fragment for the given target, preserving arrival order.
    pub fn push(&mut self, target: Target, fragment: String) {
        match target {
            Target::Reasoning => self.pending_reasoning.push(fragment),
            Target::Answer => self.pending_answer.push(fragment),
        }
    }

    /// Whether the interval gate has elapsed since the last drain.
    pub fn is_due(&self) -> bool {
        self.last_flush.elapsed() >= self.interval
    }

    /// Drain both pending sequences atomically.
    ///
    /// Returns `None` (and leaves the flush timestamp untouched) when both
    /// sequences are empty, which makes an empty flush a strict no-op.
    pub fn take(&mut self) -> Option<(String, String)> {
        if self.pending_reasoning.is_empty() && self.pending_answer.is_empty() {
            return None;
        }
        let reasoning = self.pending_reasoning.drain(..).collect::<String>();
        let answer = self.pending_answer.drain(..).collect::<String>();
        self.last_flush = Instant::now();
        Some((reasoning, answer))
    }

    /// Discard staged reasoning fragments. Used when a terminal message
    /// overrides the reasoning buffer wholesale; stale deltas must not be
    /// appended after the authoritative text.
    pub fn clear_reasoning(&mut self) {
        self.pending_reasoning.clear();
    }

    /// Discard staged answer fragments (terminal override of the answer).
    pub fn clear_answer(&mut self) {
        self.pending_answer.clear();
    }

    pub fn has_pending(&self, target: Target) -> bool {
        match target {
            Target::Reasoning => !self.pending_reasoning.is_empty(),
            Target::Answer => !self.pending_answer.is_empty(),
        }
    }

    pub fn last_flush(&self) -> Instant {
        self.last_flush
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_preserves_arrival_order() {
        let mut buffer = StreamBuffer::new(Duration::ZERO);
        buffer.push(Target::Answer, "High ".to_string());
        buffer.push(Target::Answer, "potential.".to_string());
        buffer.push(Target::Reasoning, "hmm".to_string());

        let (reasoning, answer) = buffer.take().expect("pending content");
        assert_eq!(reasoning, "hmm");
        assert_eq!(answer, "High potential.");
    }

    #[test]
    fn test_empty_take_is_a_no_op() {
        let mut buffer = StreamBuffer::new(Duration::from_millis(50));
        let before = buffer.last_flush();
        assert!(buffer.take().is_none());
        assert_eq!(buffer.last_flush(), before);
    }

    #[test]
    fn test_take_drains_both_sequences() {
        let mut buffer = StreamBuffer::new(Duration::ZERO);
        buffer.push(Target::Reasoning, "a".to_string());
        buffer.take();
        assert!(!buffer.has_pending(Target::Reasoning));
        assert!(!buffer.has_pending(Target::Answer));
        assert!(buffer.take().is_none());
    }

    #[test]
    fn test_no_loss_across_takes() {
        let mut buffer = StreamBuffer::new(Duration::ZERO);
        let mut collected = String::new();
        for (i, fragment) in ["one", "two", "three", "four"].iter().enumerate() {
            buffer.push(Target::Answer, fragment.to_string());
            if i % 2 == 1 {
                if let Some((_, answer)) = buffer.take() {
                    collected.push_str(&answer);
                }
            }
        }
        if let Some((_, answer)) = buffer.take() {
            collected.push_str(&answer);
        }
        assert_eq!(collected, "onetwothreefour");
    }

    #[test]
    fn test_clear_drops_only_the_named_target() {
        let mut buffer = StreamBuffer::new(Duration::ZERO);
        buffer.push(Target::Reasoning, "old thoughts".to_string());
        buffer.push(Target::Answer, "kept".to_string());
        buffer.clear_reasoning();

        let (reasoning, answer) = buffer.take().expect("answer still pending");
        assert_eq!(reasoning, "");
        assert_eq!(answer, "kept");
    }
}
