//! Stream engine
//!
//! Owns the read loop for one analysis session. A single task multiplexes
//! three event sources with `select!`: the next byte chunk, the periodic
//! flush tick, and cancellation. Each arm runs to completion before the next
//! fires, so session mutations are atomic steps and no locking is needed.
//! The ticker lives inside the loop scope; every exit path drops it, leaving
//! no timer running past the session.

use std::time::Duration;

use anyhow::Result;
use futures::StreamExt;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ai::config::AnalyzerConfig;
use crate::ai::fallback::{fallback_analysis, FALLBACK_NOTICE};
use crate::ai::request;
use crate::ai::session::{Session, SnapshotSink};
use crate::ai::sse::{parse_frame, LineSplitter, Utf8ChunkDecoder};
use crate::ai::transport::Transport;
use crate::ai::types::{AnalysisOutcome, AnalysisResult};

/// Analyzes one domain per call through a [`Transport`].
pub struct DomainAnalyzer<T: Transport> {
    transport: T,
    config: AnalyzerConfig,
    cancel: CancellationToken,
}

impl<T: Transport> DomainAnalyzer<T> {
    pub fn new(transport: T, config: AnalyzerConfig) -> Self {
        Self {
            transport,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Tie the session lifetime to an external cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub(super) fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub(super) fn transport(&self) -> &T {
        &self.transport
    }

    /// Analyze a domain. With a snapshot callback the response is streamed
    /// and the callback observes coalesced progress; without one, a single
    /// request/response round trip is made.
    ///
    /// Never fails: any transport-level problem degrades to the local
    /// fallback appraisal, and the outcome records which branch ran.
    pub async fn analyze(
        &self,
        domain: &str,
        on_snapshot: Option<SnapshotSink<'_>>,
    ) -> AnalysisOutcome {
        let attempt = match on_snapshot {
            Some(on) => self.run_streaming(domain, on).await,
            None => self.run_simple(domain).await,
        };

        match attempt {
            Ok(result) => AnalysisOutcome::Streamed(result),
            Err(err) => {
                warn!("analysis of {domain} degraded to local fallback: {err:#}");
                AnalysisOutcome::Degraded(AnalysisResult {
                    reasoning_content: FALLBACK_NOTICE.to_string(),
                    final_content: fallback_analysis(domain),
                })
            }
        }
    }

    async fn run_streaming(&self, domain: &str, on: SnapshotSink<'_>) -> Result<AnalysisResult> {
        let body = request::analysis_body(domain, &self.config, true);
        let mut chunks = self.transport.open_stream(&body).await?;
        info!("streaming analysis of {domain} started");

        let mut decoder = Utf8ChunkDecoder::new();
        let mut splitter = LineSplitter::new();
        let mut session = Session::new(domain, &self.config);

        // The tick guarantees a staged fragment is never stuck waiting for
        // the next chunk to arrive
        let mut ticker = time::interval(self.config.flush_interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    anyhow::bail!("analysis of {domain} was cancelled");
                }
                _ = ticker.tick() => {
                    session.flush(on);
                }
                chunk = chunks.next() => match chunk {
                    Some(Ok(bytes)) => {
                        let text = decoder.decode(&bytes);
                        for line in splitter.push(&text) {
                            if session.ingest(parse_frame(&line), on) {
                                return Ok(session.finalize(on));
                            }
                        }
                    }
                    Some(Err(err)) => {
                        return Err(err.context("reading response stream"));
                    }
                    None => break,
                },
            }
        }

        if let Some(rest) = splitter.remainder() {
            debug!("stream ended mid-line, discarding remnant: {rest}");
        }
        Ok(session.finalize(on))
    }
}
