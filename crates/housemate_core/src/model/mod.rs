//! Household domain model.
//!
//! # Responsibility
//! - Define the entity shapes owned by the store: houses and their children,
//!   the notification feed and the active selection.
//! - Carry no business rules; validation lives in the command layer.
//!
//! # Invariants
//! - A `House` owns its members and child collections; nothing else does.
//! - Cross-entity author/assignee references are plain ids (weak references).
//! - The active selection points into `houses`, never owns a house.

pub mod house;
pub mod notification;
pub mod state;
