//! HTTP route tables for the facade and the verifier

pub mod breach_routes;
pub mod verifier_routes;
