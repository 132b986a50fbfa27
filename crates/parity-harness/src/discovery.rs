//! Candidate discovery
//!
//! The candidate implementation's runnable artifact moves around depending on
//! how it was built. Discovery tries each registered invocation in priority
//! order and keeps the first one whose output is accepted, without running
//! any later candidate.

use crate::error::{HarnessError, HarnessResult, RejectedCandidate};
use crate::runner::{CommandRunner, ExecutionResult, Invocation};
use parity_trace::TraceFormat;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// What makes captured output count as a working candidate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptPolicy {
    /// Output contains a frame marker (`SENT_HEX` / `RECV_HEX`, or a record
    /// line in record mode)
    #[default]
    MarkerSubstring,
    /// At least one frame actually extracts from the output
    ExtractedFrames,
}

/// Acceptance rules applied to every candidate run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryPolicy {
    pub accept: AcceptPolicy,
    /// Also reject runs that failed or exited non-zero
    pub require_success: bool,
}

impl DiscoveryPolicy {
    /// `Ok(())` when the run is acceptable, otherwise the rejection reason
    pub fn evaluate(&self, result: &ExecutionResult, format: TraceFormat) -> Result<(), String> {
        if self.require_success {
            if let Some(err) = &result.error {
                return Err(err.to_string());
            }
        }

        let output = &result.combined_output;
        let accepted = match self.accept {
            AcceptPolicy::MarkerSubstring => format.has_marker(output),
            AcceptPolicy::ExtractedFrames => match format.extract(output) {
                Ok(frames) => !frames.is_empty(),
                Err(e) => return Err(format!("unusable trace: {}", e)),
            },
        };

        if accepted {
            return Ok(());
        }

        match &result.error {
            Some(err) => Err(format!("no frame output ({})", err)),
            None => Err("no frame output".to_string()),
        }
    }
}

/// The candidate invocation discovery settled on
#[derive(Debug)]
pub struct Discovered {
    /// Position of the invocation in the priority list
    pub index: usize,
    pub invocation: Invocation,
    pub result: ExecutionResult,
}

/// Tries candidate invocations in order until one is accepted
pub struct Discoverer<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
    policy: DiscoveryPolicy,
    format: TraceFormat,
}

impl<'a, R: CommandRunner + ?Sized> Discoverer<'a, R> {
    pub fn new(runner: &'a R) -> Self {
        Self {
            runner,
            policy: DiscoveryPolicy::default(),
            format: TraceFormat::default(),
        }
    }

    pub fn with_policy(mut self, policy: DiscoveryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_format(mut self, format: TraceFormat) -> Self {
        self.format = format;
        self
    }

    /// Run candidates in priority order, stopping at the first accepted one
    pub async fn discover(&self, candidates: &[Invocation]) -> HarnessResult<Discovered> {
        let mut attempts = Vec::new();

        for (index, invocation) in candidates.iter().enumerate() {
            let label = invocation.label();
            debug!("Trying candidate #{} '{}'", index + 1, label);

            let result = self.runner.run(invocation).await;
            match self.policy.evaluate(&result, self.format) {
                Ok(()) => {
                    if let Some(err) = &result.error {
                        warn!("Accepting candidate '{}' despite failure: {}", label, err);
                    }
                    info!("Discovered candidate #{} '{}'", index + 1, label);
                    return Ok(Discovered {
                        index,
                        invocation: invocation.clone(),
                        result,
                    });
                }
                Err(reason) => {
                    warn!("Rejected candidate '{}': {}", label, reason);
                    attempts.push(RejectedCandidate { label, reason });
                }
            }
        }

        Err(HarnessError::DiscoveryExhausted { attempts })
    }
}
