//! Runs a full reference-versus-candidate comparison

use crate::config::HarnessConfig;
use crate::discovery::Discoverer;
use crate::error::{HarnessError, HarnessResult};
use crate::report::ParityReport;
use crate::runner::{CommandRunner, ProcessRunner};
use parity_trace::{compare, Direction, FrameSequence, TraceFormat};
use tracing::{debug, info, warn};

/// Drives one parity run: reference, discovery, extraction, comparison
pub struct ParityHarness<R = ProcessRunner> {
    config: HarnessConfig,
    runner: R,
}

impl ParityHarness<ProcessRunner> {
    /// Harness that spawns real processes, honoring the configured timeout
    pub fn new(config: HarnessConfig) -> Self {
        let runner = ProcessRunner::new().with_timeout(config.timeout());
        Self { config, runner }
    }
}

impl<R: CommandRunner> ParityHarness<R> {
    pub fn with_runner(config: HarnessConfig, runner: R) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run the comparison
    ///
    /// Fatal conditions return `Err` before any comparison. A completed
    /// comparison always returns `Ok`, even when directions differ; use
    /// [`ParityReport::into_result`] to treat differences as an error.
    pub async fn run(&self) -> HarnessResult<ParityReport> {
        let format = self.config.format;
        let reference_inv = &self.config.reference;
        let reference_label = reference_inv.label();

        info!("Running reference '{}'", reference_label);
        let reference_run = self.runner.run(reference_inv).await;
        if let Some(source) = reference_run.error {
            warn!("Reference run failed, output:\n{}", reference_run.combined_output);
            return Err(HarnessError::ExecutionFailure {
                label: reference_label,
                output: reference_run.combined_output,
                source,
            });
        }
        let reference = extract_side("reference", format, &reference_run.combined_output)?;

        info!(
            "Discovering candidate among {} invocation(s)",
            self.config.candidates.len()
        );
        let discovered = Discoverer::new(&self.runner)
            .with_policy(self.config.discovery)
            .with_format(format)
            .discover(&self.config.candidates)
            .await?;
        let candidate = extract_side("candidate", format, &discovered.result.combined_output)?;

        for direction in Direction::ALL {
            info!(
                "{} frames: reference {}, candidate {}",
                direction,
                reference.count(direction),
                candidate.count(direction)
            );
        }

        let comparison = compare(&reference, &candidate);
        for failure in comparison.failures() {
            warn!(
                "{} frames do not match:\n{}",
                failure.direction,
                failure.diff.as_deref().unwrap_or_default()
            );
        }

        Ok(ParityReport {
            reference_label,
            candidate_label: discovered.invocation.label(),
            candidate_index: discovered.index,
            reference,
            candidate,
            comparison,
        })
    }
}

fn extract_side(
    side: &'static str,
    format: TraceFormat,
    output: &str,
) -> HarnessResult<FrameSequence> {
    let frames = format
        .extract(output)
        .map_err(|source| HarnessError::Trace { side, source })?;
    debug!("Extracted {} {} frames ({})", frames.len(), side, format);
    Ok(frames)
}
