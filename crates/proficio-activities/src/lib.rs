//! proficio-activities — per-activity-type evidence resolvers.
//!
//! Implements the `ActivityResolver` trait for the built-in activity types
//! (quiz, assignment, lesson) and provides the standard registry wiring.
//! Types not registered here are handled by the core's generic fallback.

pub mod assignment;
pub mod config;
pub mod lesson;
pub mod mock;
pub mod quiz;

pub use config::standard_registry;
