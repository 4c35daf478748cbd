//! Breach Tracker Library
//!
//! A cache-fronted HTTP facade for a breach-disclosure feed and a companion
//! verifier that probes it and archives evidence of each probe.

pub mod app;
pub mod archive;
pub mod cache;
pub mod cli;
pub mod clock;
pub mod config;
pub mod data;
pub mod error;
pub mod routes;
pub mod service;
pub mod telemetry;
