//! Request-level services behind the HTTP routes

pub mod breaches;
pub mod probe;

pub use breaches::{BreachEnvelope, BreachService, Health, Readiness};
pub use probe::{ProbeResult, ProbeService, PROBE_ENDPOINT};
