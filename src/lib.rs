//! Periodic HTTP health polling with optional custom CA trust and simulated crashes.

pub mod client;
pub mod config;
pub mod crash;
pub mod error;
pub mod poller;
pub mod telemetry;

pub use client::{build_client, load_trust_pool};
pub use config::{Config, OnceArgs, PollArgs};
pub use crash::{schedule_process_crash, CrashHandle};
pub use poller::{PollOutcome, Poller};
