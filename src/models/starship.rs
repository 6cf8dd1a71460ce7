use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{Validate, ValidationError, Validator};

/// A household, themed as a starship.
///
/// The starship document lives at `api/v1/starships/{id}` and owns the
/// `modules`, `missions` and `crew` sub-collections. A starship is created
/// when its captain first commissions it and is never hard-deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Starship {
    /// UID of the captain who owns the household.
    pub primary_captain_id: String,
    pub name: String,
    /// Aggregate health score, always within `0..=100`.
    pub hull_integrity: i64,
    /// Number of missions that are not yet completed.
    pub incomplete_mission_count: i64,
    pub status: StarshipStatus,
    pub last_update: DateTime<Utc>,
}

/// Overall condition of the starship.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StarshipStatus {
    Nominal,
    Warning,
    Critical,
}

impl StarshipStatus {
    /// The status a given hull integrity reading implies.
    pub fn for_hull_integrity(integrity: i64) -> Self {
        match integrity {
            i if i >= 70 => Self::Nominal,
            i if i >= 40 => Self::Warning,
            _ => Self::Critical,
        }
    }
}

impl Validate for Starship {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .non_empty(
                "primaryCaptainId",
                &self.primary_captain_id,
                "Primary Captain ID is required",
            )
            .non_empty("name", &self.name, "Starship name is required")
            .min(
                "hullIntegrity",
                self.hull_integrity,
                0,
                "Hull integrity cannot be less than 0",
            )
            .max(
                "hullIntegrity",
                self.hull_integrity,
                100,
                "Hull integrity cannot be more than 100",
            )
            .min(
                "incompleteMissionCount",
                self.incomplete_mission_count,
                0,
                "Incomplete mission count cannot be negative",
            )
            .finish()
    }
}

/// Input for commissioning a new starship. The caller becomes its captain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionStarshipInput {
    pub name: String,
    /// Display name for the captain's own crew record.
    pub captain_name: String,
}

/// Partial update for a starship. Absent fields are left untouched.
///
/// `status` and `incompleteMissionCount` are not accepted here: status
/// follows hull integrity and the count follows the missions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStarshipInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hull_integrity: Option<i64>,
}

impl Validate for UpdateStarshipInput {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .optional(self.name.as_ref(), |v, name| {
                v.non_empty("name", name, "Starship name is required");
            })
            .optional(self.hull_integrity.as_ref(), |v, hull| {
                v.min("hullIntegrity", *hull, 0, "Hull integrity cannot be less than 0")
                    .max("hullIntegrity", *hull, 100, "Hull integrity cannot be more than 100");
            })
            .finish()
    }
}

/// Body of the hull-integrity endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HullIntegrityInput {
    pub hull_integrity: i64,
}

/// The user → household shortcut stored at `api/v1/userStarships/{uid}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStarship {
    pub starship_id: String,
}

impl Validate for UserStarship {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .non_empty("starshipId", &self.starship_id, "Starship ID is required")
            .finish()
    }
}
