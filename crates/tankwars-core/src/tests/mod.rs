//! Scenario tests for the full tick pipeline.
//!
//! - `integration.rs`: end-to-end gameplay scenarios driven through [`Game`](crate::game::Game)
//! - `determinism.rs`: same seed and inputs give identical snapshots
//! - `helpers.rs`: setup utilities shared by both

mod helpers;
