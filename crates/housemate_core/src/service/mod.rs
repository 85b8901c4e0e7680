//! Store façade and read projections.
//!
//! # Responsibility
//! - Compose the reducer with snapshot persistence behind one command/query
//!   surface for presentation layers.
//! - Keep UI layers decoupled from storage and reducer details.

pub mod household_store;
pub mod read_model;
