//! Trimlab Core: domain types, indicators, trim triggers, reinvestment
//! policies and the portfolio simulator.
//!
//! This crate contains the heart of the profit-trimming backtester:
//! - Domain types (tickers, price table, positions, cash pools, events)
//! - Indicator computer (moving average, momentum, realized volatility, median)
//! - Trim triggers (threshold, momentum, volatility regime, buy-and-hold)
//! - Reinvestment policies (cash, pro-rata, single target, drip, dip-buy,
//!   volatility-gated)
//! - Day-by-day simulation loop with a daily reconciliation check
//! - Price alignment, synthetic fixtures and the deterministic RNG hierarchy

pub mod components;
pub mod data;
pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod indicators;
pub mod rng;
