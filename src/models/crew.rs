use serde::{Deserialize, Serialize};

use crate::validation::{Validate, ValidationError, Validator};

/// A household member aboard a starship.
///
/// Crew records for dependents are created by the captain *before* the
/// person joins: `uid` is empty and a registration code is attached. When
/// the code is redeemed the record is bound to the redeemer's UID and the
/// code is cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Crew {
    /// Authentication UID, empty until the member has joined.
    #[serde(default)]
    pub uid: String,
    pub name: String,
    pub role: CrewRole,
    pub credits: i64,
    pub xp: i64,
    pub level: i64,
    /// Epoch milliseconds.
    pub created_date: i64,
    /// Outstanding join code, empty when none.
    #[serde(default)]
    pub registration_code: String,
    /// Epoch milliseconds; `0` when no code is outstanding.
    #[serde(default)]
    pub registration_code_expiry: i64,
    #[serde(default)]
    pub status: CrewStatus,
    /// Epoch milliseconds.
    #[serde(default)]
    pub last_seen: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CrewRole {
    Captain,
    Crew,
}

/// Presence of a crew member's link to the ship.
///
/// - `Pending`: recruited, has not joined yet
/// - `Stable`: joined and recently seen
/// - `Weak`: joined, not seen for a while
/// - `Offline`: joined, long absent
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CrewStatus {
    #[default]
    Pending,
    Stable,
    Weak,
    Offline,
}

impl Crew {
    pub fn has_joined(&self) -> bool {
        !self.uid.is_empty()
    }

    pub fn has_open_code(&self) -> bool {
        !self.registration_code.is_empty()
    }
}

impl Validate for Crew {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .non_empty("name", &self.name, "Name is required")
            .min("credits", self.credits, 0, "Credits cannot be negative")
            .min("xp", self.xp, 0, "XP cannot be negative")
            .min("level", self.level, 1, "Level must be at least 1")
            .min(
                "registrationCodeExpiry",
                self.registration_code_expiry,
                0,
                "Registration code expiry cannot be negative",
            )
            .finish()
    }
}

/// Input for recruiting a new crew member placeholder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecruitCrewInput {
    pub name: String,
}

/// Partial update for a crew member's profile and progress.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCrewInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CrewStatus>,
}

impl Validate for UpdateCrewInput {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .optional(self.name.as_ref(), |v, name| {
                v.non_empty("name", name, "Name is required");
            })
            .optional(self.credits.as_ref(), |v, credits| {
                v.min("credits", *credits, 0, "Credits cannot be negative");
            })
            .optional(self.xp.as_ref(), |v, xp| {
                v.min("xp", *xp, 0, "XP cannot be negative");
            })
            .optional(self.level.as_ref(), |v, level| {
                v.min("level", *level, 1, "Level must be at least 1");
            })
            .finish()
    }
}
