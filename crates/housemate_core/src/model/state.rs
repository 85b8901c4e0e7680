//! Root state snapshot.
//!
//! # Responsibility
//! - Hold every house, the active selection and the notification feed.
//! - Provide lookups used by both the reducer and read projections.
//!
//! # Invariants
//! - `active_member_id` is either `None` or a member of `active_house_id`.
//! - A snapshot is never mutated once published by the store.

use crate::ids::normalize_house_code;
use crate::model::house::{House, HouseId, Member, MemberId};
use crate::model::notification::Notification;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Complete persisted state; serialized as one blob.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdState {
    #[serde(default)]
    pub houses: Vec<House>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_house_id: Option<HouseId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_member_id: Option<MemberId>,
    /// Newest first.
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

impl HouseholdState {
    pub fn house(&self, id: HouseId) -> Option<&House> {
        self.houses.iter().find(|house| house.id == id)
    }

    pub(crate) fn house_index(&self, id: HouseId) -> Option<usize> {
        self.houses.iter().position(|house| house.id == id)
    }

    /// Looks a house up by join code, normalizing the input first.
    pub fn house_by_code(&self, code: &str) -> Option<&House> {
        let normalized = normalize_house_code(code);
        self.houses
            .iter()
            .find(|house| normalize_house_code(&house.code) == normalized)
    }

    /// Normalized codes of every house.
    pub fn house_codes(&self) -> HashSet<String> {
        self.houses
            .iter()
            .map(|house| normalize_house_code(&house.code))
            .collect()
    }

    pub fn active_house(&self) -> Option<&House> {
        self.active_house_id.and_then(|id| self.house(id))
    }

    /// Resolves the active member inside the active house.
    pub fn active_member(&self) -> Option<&Member> {
        let member_id = self.active_member_id?;
        self.active_house()?.member(member_id)
    }

    pub fn clear_selection(&mut self) {
        self.active_house_id = None;
        self.active_member_id = None;
    }
}
