//! proficio-core — Competency progress & evidence engine.
//!
//! This crate defines the data model, collaborator traits, and the five
//! engine components: the framework store (course forests), the activity
//! link index, the status resolver, the evidence aggregator, and the
//! rating workflow, plus the session-guarded service facade over them.

pub mod error;
pub mod evidence;
pub mod forest;
pub mod index;
pub mod model;
pub mod parser;
pub mod rating;
pub mod registry;
pub mod service;
pub mod status;
pub mod traits;
