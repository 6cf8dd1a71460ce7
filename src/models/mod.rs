//! Domain models for Starship Command.
//!
//! # Core Concepts
//!
//! - [`Starship`]: the household. One captain owns it; everything else hangs
//!   off it as a sub-collection.
//! - [`Module`]: a room aboard the starship.
//! - [`Mission`]: a chore, driven through `pending → active → under_review →
//!   completed` by the lifecycle rules in [`mission`].
//! - [`Crew`]: a household member. Placeholder records exist before the
//!   person joins; they carry a registration code until it is redeemed.
//! - [`UserStarship`]: the user → household shortcut used by discovery.
//!
//! Records read from the store are wrapped in [`Record`], which pairs the
//! document id with the validated body.

mod crew;
mod invite;
pub mod mission;
mod module;
mod starship;

pub use crew::*;
pub use invite::*;
pub use mission::{
    CreateMissionInput, LifecycleError, Mission, MissionAction, MissionDifficulty, MissionStatus,
    MissionView, UpdateMissionInput,
};
pub use module::*;
pub use starship::*;

use serde::{Deserialize, Serialize};

/// A validated document body together with its id.
///
/// The id is flattened next to the body fields in JSON responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    pub id: String,
    #[serde(flatten)]
    pub data: T,
}
