//! Client Core — Exchange Client Computation Layer
//!
//! Provides deterministic, network-free computation for:
//! - HMAC-SHA256 signing of authenticated REST requests
//! - Lot reconciliation of buys against sells on a cumulative-quantity axis
//! - Fill aggregation, trade resampling, order-book statistics
//! - Mark-to-market valuation and JSON export of reconciliation results
//!
//! # Determinism
//! Everything except [`signing::SystemClock`] is pure. Time enters signing
//! only through the [`signing::Clock`] trait.
//! Uses `Decimal` (fixed-point) and `BTreeMap` (sorted iteration) throughout.

pub mod signing;
pub mod reconcile;
pub mod aggregation;
pub mod resample;
pub mod depth;
pub mod valuation;
pub mod export;

/// Crate version constant
pub const CLIENT_CORE_VERSION: &str = "0.1.0";
