//! Trace replay driver for the delayed-hit cache simulator (spec §6): CLI
//! plumbing, trace parsing, result/packet serialization, and a synthetic
//! trace generator, all built on the [`dhcache`] engine.

pub mod error;
pub mod generator;
pub mod input;
pub mod models;
pub mod runner;
pub mod stats;
