//! noctiluca-core — The avatar simulation engine, no UI.
//!
//! This crate contains the complete entity model, state profiles, spawner,
//! physics, and input adapter for the Noctiluca animated avatar. It is
//! completely renderer-agnostic — frontends (CLI, Web) subscribe to
//! per-tick snapshots via tokio::broadcast and draw them however they like.

pub mod adapter;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod physics;
pub mod profile;
pub mod responder;
pub mod rng;
pub mod shift;
pub mod sim;
pub mod spawner;
pub mod types;
