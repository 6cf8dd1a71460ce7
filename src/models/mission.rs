//! Missions and their lifecycle.
//!
//! A mission moves strictly forward through
//! `Pending → Active → UnderReview → Completed`:
//!
//! - **claim** (`Pending → Active`): allowed when the mission is unassigned or
//!   already assigned to the acting user; the actor becomes the assignee.
//! - **submit** (`Active → UnderReview`): only the assignee may submit.
//! - **approve** (`UnderReview → Completed`): only a captain may approve.
//!
//! `Completed` is terminal. There is no reject path back to `Active`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::{Validate, ValidationError, Validator};

/// A chore with a reward, an optional assignee and a lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub title: String,
    pub description: String,
    /// Credits awarded on completion. Never negative.
    pub credit_reward: i64,
    /// UID of the assigned crew member, or empty when unassigned.
    pub assigned_to: String,
    pub difficulty: MissionDifficulty,
    pub status: MissionStatus,
    /// The module (room) this mission belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MissionDifficulty {
    Easy,
    Medium,
    Hard,
}

/// The lifecycle state of a mission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    Pending,
    Active,
    UnderReview,
    Completed,
}

impl MissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::UnderReview => "under_review",
            Self::Completed => "completed",
        }
    }

    /// The only state this one may move to, or `None` once completed.
    pub fn successor(&self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Active),
            Self::Active => Some(Self::UnderReview),
            Self::UnderReview => Some(Self::Completed),
            Self::Completed => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle step requested by a household member.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MissionAction {
    Claim,
    Submit,
    Approve,
}

impl MissionAction {
    /// The state a mission must be in for this action to apply.
    pub fn source(&self) -> MissionStatus {
        match self {
            Self::Claim => MissionStatus::Pending,
            Self::Submit => MissionStatus::Active,
            Self::Approve => MissionStatus::UnderReview,
        }
    }

    pub fn target(&self) -> MissionStatus {
        match self {
            Self::Claim => MissionStatus::Active,
            Self::Submit => MissionStatus::UnderReview,
            Self::Approve => MissionStatus::Completed,
        }
    }

    /// The action that moves a mission into `target`, if any.
    pub fn into_status(target: MissionStatus) -> Option<Self> {
        match target {
            MissionStatus::Active => Some(Self::Claim),
            MissionStatus::UnderReview => Some(Self::Submit),
            MissionStatus::Completed => Some(Self::Approve),
            MissionStatus::Pending => None,
        }
    }
}

/// Why a lifecycle step was refused.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Cannot move mission from {from} to {to}")]
    InvalidTransition {
        from: MissionStatus,
        to: MissionStatus,
    },

    #[error("Mission is already assigned to another crew member")]
    AlreadyAssigned,

    #[error("Only the assigned crew member can submit this mission")]
    NotAssignee,

    #[error("Only a captain can approve missions")]
    CaptainRequired,
}

impl Mission {
    pub fn is_assigned(&self) -> bool {
        !self.assigned_to.is_empty()
    }

    pub fn is_assigned_to(&self, uid: &str) -> bool {
        !uid.is_empty() && self.assigned_to == uid
    }

    /// Apply `action` on behalf of `actor_uid`.
    ///
    /// Returns the mission as it should be written back; `self` is left
    /// untouched so the caller can write conditionally on the old status.
    pub fn apply(
        &self,
        action: MissionAction,
        actor_uid: &str,
        actor_is_captain: bool,
    ) -> Result<Mission, LifecycleError> {
        if self.status != action.source() {
            return Err(LifecycleError::InvalidTransition {
                from: self.status,
                to: action.target(),
            });
        }

        let mut next = self.clone();
        match action {
            MissionAction::Claim => {
                if self.is_assigned() && !self.is_assigned_to(actor_uid) {
                    return Err(LifecycleError::AlreadyAssigned);
                }
                next.assigned_to = actor_uid.to_string();
            }
            MissionAction::Submit => {
                if !self.is_assigned_to(actor_uid) {
                    return Err(LifecycleError::NotAssignee);
                }
            }
            MissionAction::Approve => {
                if !actor_is_captain {
                    return Err(LifecycleError::CaptainRequired);
                }
            }
        }
        next.status = action.target();
        Ok(next)
    }

    /// Move to `target`, which must be the immediate successor of the
    /// current status.
    pub fn advance_to(
        &self,
        target: MissionStatus,
        actor_uid: &str,
        actor_is_captain: bool,
    ) -> Result<Mission, LifecycleError> {
        if self.status.successor() != Some(target) {
            return Err(LifecycleError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }
        let action = MissionAction::into_status(target).ok_or(LifecycleError::InvalidTransition {
            from: self.status,
            to: target,
        })?;
        self.apply(action, actor_uid, actor_is_captain)
    }
}

impl Validate for Mission {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut v = Validator::new();
        v.non_empty("title", &self.title, "Mission title is required")
            .min(
                "creditReward",
                self.credit_reward,
                0,
                "Credit reward cannot be negative",
            );
        if let Some(module_id) = &self.module_id {
            v.non_empty("moduleId", module_id, "Module ID cannot be blank");
        }
        v.finish()
    }
}

/// Read-side filters over a household's missions.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MissionView {
    /// Assigned to the caller and not yet completed.
    Mine,
    /// Unassigned and still pending.
    Available,
    #[default]
    All,
}

impl MissionView {
    pub fn includes(&self, mission: &Mission, caller_uid: &str) -> bool {
        match self {
            Self::Mine => mission.is_assigned_to(caller_uid) && !mission.status.is_complete(),
            Self::Available => !mission.is_assigned() && mission.status == MissionStatus::Pending,
            Self::All => true,
        }
    }
}

/// Input for creating a mission. New missions always start `Pending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMissionInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub credit_reward: i64,
    pub difficulty: MissionDifficulty,
    #[serde(default)]
    pub module_id: Option<String>,
    /// Pre-assign to a crew member's UID.
    #[serde(default)]
    pub assigned_to: Option<String>,
}

impl From<CreateMissionInput> for Mission {
    fn from(input: CreateMissionInput) -> Self {
        Mission {
            title: input.title,
            description: input.description,
            credit_reward: input.credit_reward,
            assigned_to: input.assigned_to.unwrap_or_default(),
            difficulty: input.difficulty,
            status: MissionStatus::Pending,
            module_id: input.module_id.filter(|m| !m.is_empty()),
        }
    }
}

/// Partial update for a mission's details. Status only changes through
/// lifecycle steps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMissionInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_reward: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<MissionDifficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
}

impl Validate for UpdateMissionInput {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .optional(self.title.as_ref(), |v, title| {
                v.non_empty("title", title, "Mission title is required");
            })
            .optional(self.credit_reward.as_ref(), |v, reward| {
                v.min("creditReward", *reward, 0, "Credit reward cannot be negative");
            })
            .optional(self.module_id.as_ref(), |v, module_id| {
                v.non_empty("moduleId", module_id, "Module ID cannot be blank");
            })
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> Mission {
        Mission {
            title: "Dishes".to_string(),
            description: String::new(),
            credit_reward: 50,
            assigned_to: String::new(),
            difficulty: MissionDifficulty::Easy,
            status: MissionStatus::Pending,
            module_id: None,
        }
    }

    #[test]
    fn full_lifecycle_claim_submit_approve() {
        let active = pending().apply(MissionAction::Claim, "U1", false).unwrap();
        assert_eq!(active.status, MissionStatus::Active);
        assert_eq!(active.assigned_to, "U1");

        let review = active.apply(MissionAction::Submit, "U1", false).unwrap();
        assert_eq!(review.status, MissionStatus::UnderReview);

        let done = review.apply(MissionAction::Approve, "C1", true).unwrap();
        assert_eq!(done.status, MissionStatus::Completed);
        assert_eq!(done.assigned_to, "U1");
    }

    #[test]
    fn cannot_skip_straight_to_completed() {
        let err = pending()
            .advance_to(MissionStatus::Completed, "C1", true)
            .unwrap_err();
        assert_eq!(
            err,
            LifecycleError::InvalidTransition {
                from: MissionStatus::Pending,
                to: MissionStatus::Completed,
            }
        );
    }

    #[test]
    fn claim_respects_existing_assignee() {
        let mut mission = pending();
        mission.assigned_to = "U1".to_string();

        assert_eq!(
            mission.apply(MissionAction::Claim, "U2", false).unwrap_err(),
            LifecycleError::AlreadyAssigned
        );
        assert!(mission.apply(MissionAction::Claim, "U1", false).is_ok());
    }

    #[test]
    fn only_assignee_submits() {
        let active = pending().apply(MissionAction::Claim, "U1", false).unwrap();
        assert_eq!(
            active.apply(MissionAction::Submit, "U2", false).unwrap_err(),
            LifecycleError::NotAssignee
        );
    }

    #[test]
    fn crew_cannot_approve() {
        let review = pending()
            .apply(MissionAction::Claim, "U1", false)
            .and_then(|m| m.apply(MissionAction::Submit, "U1", false))
            .unwrap();

        assert_eq!(
            review.apply(MissionAction::Approve, "U1", false).unwrap_err(),
            LifecycleError::CaptainRequired
        );
    }

    #[test]
    fn completed_is_terminal() {
        let mut done = pending();
        done.status = MissionStatus::Completed;

        assert_eq!(done.status.successor(), None);
        for action in [MissionAction::Claim, MissionAction::Submit, MissionAction::Approve] {
            assert!(done.apply(action, "C1", true).is_err());
        }
        assert!(done.advance_to(MissionStatus::Active, "C1", true).is_err());
    }

    #[test]
    fn views_filter_by_assignee_and_status() {
        let open = pending();
        let mine = pending().apply(MissionAction::Claim, "U1", false).unwrap();
        let mut finished = mine.clone();
        finished.status = MissionStatus::Completed;

        assert!(MissionView::Available.includes(&open, "U1"));
        assert!(!MissionView::Available.includes(&mine, "U1"));
        assert!(MissionView::Mine.includes(&mine, "U1"));
        assert!(!MissionView::Mine.includes(&mine, "U2"));
        assert!(!MissionView::Mine.includes(&finished, "U1"));
        assert!(MissionView::All.includes(&finished, "U2"));
    }

    #[test]
    fn negative_reward_is_invalid() {
        let mut mission = pending();
        mission.credit_reward = -5;
        assert!(mission.validate().unwrap_err().has_field("creditReward"));
    }
}
