use serde::{Deserialize, Serialize};

use crate::validation::{Validate, ValidationError, Validator};

/// A room in the household, themed as a ship module.
///
/// `incomplete_missions` is denormalized: it lists the missions assigned to
/// this room that are not yet completed, and is rewritten whenever a
/// mission changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    /// Ship-side name, e.g. "Engine Room".
    pub name: String,
    /// The real room it stands for, e.g. "Laundry".
    pub real_world_room: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub incomplete_missions: Vec<MissionRef>,
}

/// Reference to a mission document by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionRef {
    pub id: String,
}

impl Validate for Module {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut v = Validator::new();
        v.non_empty("name", &self.name, "Module name is required")
            .non_empty(
                "realWorldRoom",
                &self.real_world_room,
                "Real world room name is required",
            );
        for mission in &self.incomplete_missions {
            v.non_empty("incompleteMissions", &mission.id, "Mission ID is required");
        }
        v.finish()
    }
}

/// Input for adding a module.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateModuleInput {
    pub name: String,
    pub real_world_room: String,
    #[serde(default)]
    pub icon: Option<String>,
}

impl From<CreateModuleInput> for Module {
    fn from(input: CreateModuleInput) -> Self {
        Module {
            name: input.name,
            real_world_room: input.real_world_room,
            icon: input.icon,
            incomplete_missions: Vec::new(),
        }
    }
}

/// Partial update for a module. The mission list is maintained by the
/// service and cannot be written directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateModuleInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_world_room: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Validate for UpdateModuleInput {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .optional(self.name.as_ref(), |v, name| {
                v.non_empty("name", name, "Module name is required");
            })
            .optional(self.real_world_room.as_ref(), |v, room| {
                v.non_empty("realWorldRoom", room, "Real world room name is required");
            })
            .finish()
    }
}
