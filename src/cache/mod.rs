//! Cache module for the breach feed
//!
//! This module provides a single-slot in-memory store with a configurable TTL.
//! It supports graceful degradation by returning expired entries with an
//! `is_expired` flag, allowing the service to serve stale data when the
//! upstream feed is unavailable.

mod store;

pub use store::{CacheStore, CachedData};
