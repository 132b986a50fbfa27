//! Wire-level parity harness
//!
//! Runs a reference implementation and a candidate implementation of the same
//! device-control protocol, pulls the frames each one logged, and checks that
//! both sent and received the same frames in the same order.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐      ┌─────────────────────────┐
//! │  Reference      │      │  Candidate              │
//! │  (one fixed     │      │  (first of N invocations│
//! │   invocation)   │      │   that prints frames)   │
//! └────────┬────────┘      └────────────┬────────────┘
//!          │ CommandRunner              │ Discoverer
//!          └──────────┬─────────────────┘
//!                     │ captured text
//!              ┌──────▼──────┐
//!              │  extract +  │
//!              │  compare    │
//!              └─────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use parity_harness::{HarnessConfig, ParityHarness};
//!
//! let harness = ParityHarness::new(HarnessConfig::from_env()?);
//! let report = harness.run().await?;
//! report.print_summary();
//! report.into_result()?;
//! ```

pub mod config;
pub mod discovery;
mod error;
pub mod orchestrator;
pub mod report;
pub mod runner;

#[cfg(test)]
mod testing;

pub use config::HarnessConfig;
pub use discovery::{AcceptPolicy, Discovered, Discoverer, DiscoveryPolicy};
pub use error::{ConfigError, ConfigResult, HarnessError, HarnessResult, RejectedCandidate};
pub use orchestrator::ParityHarness;
pub use report::{ParityReport, SequenceMismatch};
pub use runner::{CommandRunner, ExecutionError, ExecutionResult, Invocation, ProcessRunner};

// Re-export the trace crate so callers need only one dependency
pub use parity_trace;
