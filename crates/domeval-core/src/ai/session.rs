//! Session state machine
//!
//! One [`Session`] per analysis invocation. It owns the two growing text
//! buffers, tracks which narrative phase the model is in, and classifies each
//! incoming [`Frame`] into buffer writes and phase transitions. The upstream
//! protocol never marks the reasoning/answer boundary explicitly, so the
//! transition is inferred: an answer fragment, a finish signal, or (behind a
//! config toggle) an empty delta each end the reasoning phase. The phase is
//! monotonic; a late reasoning fragment can never drag it back.

use tracing::{debug, info, warn};

use super::config::AnalyzerConfig;
use super::stream_buffer::StreamBuffer;
use super::types::{AnalysisResult, Frame, Phase, Snapshot, Target};

/// Consumer callback receiving coalesced snapshots.
pub type SnapshotSink<'a> = &'a mut dyn FnMut(Snapshot);

/// Per-invocation streaming state. Not shared, not reused.
pub struct Session {
    domain: String,
    phase: Phase,
    /// Finish signal consumed exactly once per session.
    has_seen_phase_signal: bool,
    /// Set once the end of reasoning was inferred from any signal.
    reasoning_done: bool,
    empty_delta_ends_reasoning: bool,
    reasoning_text: String,
    final_text: String,
    buffer: StreamBuffer,
}

impl Session {
    pub fn new(domain: &str, config: &AnalyzerConfig) -> Self {
        Self {
            domain: domain.to_string(),
            phase: Phase::Reasoning,
            has_seen_phase_signal: false,
            reasoning_done: false,
            empty_delta_ends_reasoning: config.empty_delta_ends_reasoning,
            reasoning_text: String::new(),
            final_text: String::new(),
            buffer: StreamBuffer::new(config.flush_interval),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Classify one frame. Returns `true` when the stream signalled its end
    /// and the caller should finalize.
    pub fn ingest(&mut self, frame: Frame, on: SnapshotSink) -> bool {
        match frame {
            Frame::Terminal {
                content,
                reasoning_content,
            } => {
                // An authoritative full result always wins over the delta
                // transcript: overwrite, do not append, and drop any staged
                // fragments for the overridden buffer.
                if let Some(text) = content {
                    info!("terminal message overrides answer ({} chars)", text.len());
                    self.buffer.clear_answer();
                    self.final_text = text;
                    self.advance(Phase::Answering);
                }
                if let Some(text) = reasoning_content {
                    info!(
                        "terminal message overrides reasoning ({} chars)",
                        text.len()
                    );
                    self.buffer.clear_reasoning();
                    self.reasoning_text = text;
                }
                self.flush(on);
                false
            }

            Frame::Delta {
                reasoning_fragment,
                answer_fragment,
                finish_signal,
            } => {
                self.ingest_delta(reasoning_fragment, answer_fragment, finish_signal, on);
                false
            }

            Frame::Sentinel => true,

            Frame::Malformed { raw_line } => {
                warn!("skipping malformed frame: {raw_line}");
                false
            }
        }
    }

    fn ingest_delta(
        &mut self,
        reasoning_fragment: Option<String>,
        answer_fragment: Option<String>,
        finish_signal: Option<String>,
        on: SnapshotSink,
    ) {
        // Checked before the answer fields: a frame carrying both a
        // reasoning fragment and an answer hint continues the reasoning
        // narrative (reasoning arrives first in the two-phase protocol)
        if let Some(reasoning) = reasoning_fragment {
            if !reasoning.trim().is_empty() {
                self.append(Target::Reasoning, reasoning, on);
            } else if let Some(fragment) = answer_fragment {
                debug!("empty reasoning fragment with answer content present");
                let changed = self.advance(Phase::Answering);
                self.append(Target::Answer, fragment, on);
                if changed {
                    self.flush(on);
                }
            }
            return;
        }

        if answer_fragment.is_some() || finish_signal.is_some() {
            if let Some(reason) = finish_signal {
                if !self.has_seen_phase_signal {
                    info!("finish signal received: {reason}");
                    self.has_seen_phase_signal = true;
                    self.reasoning_done = true;
                    if self.advance(Phase::Answering) {
                        self.flush(on);
                    }
                }
            }
            if let Some(fragment) = answer_fragment {
                let changed = self.advance(Phase::Answering);
                self.append(Target::Answer, fragment, on);
                if changed {
                    self.flush(on);
                }
            }
            return;
        }

        // Empty delta: heuristic end-of-reasoning hint, consumed at most
        // once. Only fires while no answer content has arrived.
        if self.empty_delta_ends_reasoning && !self.reasoning_done {
            self.reasoning_done = true;
            debug!("empty delta; treating as end-of-reasoning hint");
            if self.has_content(Target::Reasoning) && !self.has_content(Target::Answer) {
                if self.advance(Phase::Answering) {
                    self.flush(on);
                }
            }
        }
    }

    /// Stage a fragment, then emit a snapshot if the interval gate elapsed.
    fn append(&mut self, target: Target, fragment: String, on: SnapshotSink) {
        self.buffer.push(target, fragment);
        if self.buffer.is_due() {
            self.flush(on);
        }
    }

    /// Drain pending fragments onto the growing texts and notify the
    /// consumer. A no-op when nothing is pending, so repeated calls (timer
    /// ticks, forced flushes) are harmless.
    pub fn flush(&mut self, on: SnapshotSink) {
        if let Some((reasoning, answer)) = self.buffer.take() {
            self.reasoning_text.push_str(&reasoning);
            self.final_text.push_str(&answer);
            on(Snapshot {
                reasoning_content: self.reasoning_text.clone(),
                final_content: self.final_text.clone(),
                is_reasoning_phase: self.phase == Phase::Reasoning,
            });
        }
    }

    /// Final forced flush; the session is consumed and yields the
    /// consolidated result.
    pub fn finalize(mut self, on: SnapshotSink) -> AnalysisResult {
        self.flush(on);
        self.phase = Phase::Done;
        info!(
            "session for {} finished: {} reasoning chars, {} answer chars",
            self.domain,
            self.reasoning_text.len(),
            self.final_text.len()
        );
        AnalysisResult {
            reasoning_content: self.reasoning_text,
            final_content: self.final_text,
        }
    }

    /// Monotonic phase advance; returns whether the phase actually moved.
    fn advance(&mut self, phase: Phase) -> bool {
        if phase > self.phase {
            debug!("phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
            true
        } else {
            false
        }
    }

    /// Accumulated or staged content for a target.
    fn has_content(&self, target: Target) -> bool {
        let accumulated = match target {
            Target::Reasoning => !self.reasoning_text.is_empty(),
            Target::Answer => !self.final_text.is_empty(),
        };
        accumulated || self.buffer.has_pending(target)
    }
}
