//! Mission CRUD and lifecycle steps.
//!
//! Lifecycle rules live on [`Mission`]; this layer resolves the actor's
//! role, applies the rule and writes the result conditionally on the status
//! it read, so two members racing to claim the same mission cannot both win.

use serde_json::json;

use super::FleetService;
use crate::db::paths;
use crate::error::{FleetError, FleetResult};
use crate::models::{
    CreateMissionInput, CrewRole, Mission, MissionAction, MissionStatus, MissionView, Record,
    UpdateMissionInput,
};
use crate::validation::{Validate, ValidationError};

impl FleetService {
    /// Missions of a starship through one of the read-side views.
    ///
    /// [`MissionView::Mine`] needs a caller; the other views do not.
    pub fn list_missions(
        &self,
        starship_id: &str,
        caller: Option<&str>,
        view: MissionView,
    ) -> FleetResult<Vec<Record<Mission>>> {
        let caller = caller.unwrap_or_default();
        if view == MissionView::Mine && caller.is_empty() {
            return Err(FleetError::AuthenticationRequired);
        }
        let missions: Vec<Record<Mission>> = self.read_all(&paths::missions(starship_id))?;
        Ok(missions
            .into_iter()
            .filter(|m| view.includes(&m.data, caller))
            .collect())
    }

    pub fn get_mission(&self, starship_id: &str, mission_id: &str) -> FleetResult<Record<Mission>> {
        self.require(&paths::mission(starship_id, mission_id), "Mission")
    }

    pub fn add_mission(
        &self,
        starship_id: &str,
        actor: Option<&str>,
        input: CreateMissionInput,
    ) -> FleetResult<Record<Mission>> {
        self.require_member(starship_id, actor)?;

        let mission = Mission::from(input);
        mission.validate()?;
        self.ensure_module_exists(starship_id, mission.module_id.as_deref())?;
        self.ensure_assignable(starship_id, &mission.assigned_to)?;

        let mission = self.insert(&paths::missions(starship_id), mission)?;
        tracing::info!(%starship_id, mission_id = %mission.id, "Mission added");

        self.refresh_aggregates_after_write(starship_id);
        Ok(mission)
    }

    /// Edit a mission's details. The assignee can only be changed while the
    /// mission is still pending; status never changes here.
    pub fn update_mission(
        &self,
        starship_id: &str,
        mission_id: &str,
        actor: Option<&str>,
        input: UpdateMissionInput,
    ) -> FleetResult<Record<Mission>> {
        self.require_member(starship_id, actor)?;
        input.validate()?;

        let existing = self.get_mission(starship_id, mission_id)?;
        if let Some(assignee) = &input.assigned_to {
            if existing.data.status != MissionStatus::Pending
                && *assignee != existing.data.assigned_to
            {
                return Err(FleetError::Forbidden(
                    "Assignee can only change while the mission is pending".to_string(),
                ));
            }
            self.ensure_assignable(starship_id, assignee)?;
        }
        self.ensure_module_exists(starship_id, input.module_id.as_deref())?;

        self.patch(&paths::mission(starship_id, mission_id), &input, "Mission")?;
        self.refresh_aggregates_after_write(starship_id);
        self.get_mission(starship_id, mission_id)
    }

    pub fn delete_mission(
        &self,
        starship_id: &str,
        mission_id: &str,
        actor: Option<&str>,
    ) -> FleetResult<()> {
        self.require_member(starship_id, actor)?;
        if !self.db.delete(&paths::mission(starship_id, mission_id))? {
            return Err(FleetError::NotFound("Mission".to_string()));
        }
        tracing::info!(%starship_id, %mission_id, "Mission deleted");
        self.refresh_aggregates_after_write(starship_id);
        Ok(())
    }

    /// `pending → active`: take on an unassigned mission (or one already
    /// assigned to the actor).
    pub fn claim_mission(
        &self,
        starship_id: &str,
        mission_id: &str,
        actor: Option<&str>,
    ) -> FleetResult<Record<Mission>> {
        self.perform(starship_id, mission_id, actor, MissionAction::Claim)
    }

    /// `active → under_review`: the assignee hands the work in.
    pub fn submit_mission(
        &self,
        starship_id: &str,
        mission_id: &str,
        actor: Option<&str>,
    ) -> FleetResult<Record<Mission>> {
        self.perform(starship_id, mission_id, actor, MissionAction::Submit)
    }

    /// `under_review → completed`: a captain signs the work off.
    pub fn approve_mission(
        &self,
        starship_id: &str,
        mission_id: &str,
        actor: Option<&str>,
    ) -> FleetResult<Record<Mission>> {
        self.perform(starship_id, mission_id, actor, MissionAction::Approve)
    }

    /// Move a mission to `target`, which must be the next status in line.
    pub fn advance_mission(
        &self,
        starship_id: &str,
        mission_id: &str,
        actor: Option<&str>,
        target: MissionStatus,
    ) -> FleetResult<Record<Mission>> {
        let (uid, role) = self.require_member(starship_id, actor)?;
        let mission = self.get_mission(starship_id, mission_id)?;
        let next = mission
            .data
            .advance_to(target, &uid, role == CrewRole::Captain)?;
        self.write_transition(starship_id, mission, next)
    }

    fn perform(
        &self,
        starship_id: &str,
        mission_id: &str,
        actor: Option<&str>,
        action: MissionAction,
    ) -> FleetResult<Record<Mission>> {
        let (uid, role) = self.require_member(starship_id, actor)?;
        let mission = self.get_mission(starship_id, mission_id)?;
        let next = mission
            .data
            .apply(action, &uid, role == CrewRole::Captain)?;
        self.write_transition(starship_id, mission, next)
    }

    fn write_transition(
        &self,
        starship_id: &str,
        current: Record<Mission>,
        next: Mission,
    ) -> FleetResult<Record<Mission>> {
        let path = paths::mission(starship_id, &current.id);
        let written = self.db.merge_if(
            &path,
            "status",
            current.data.status.as_str(),
            &json!({
                "status": next.status,
                "assignedTo": next.assigned_to,
            }),
        )?;
        if !written {
            return Err(FleetError::Conflict(
                "Mission changed while the update was in flight".to_string(),
            ));
        }

        tracing::info!(
            %starship_id,
            mission_id = %current.id,
            from = %current.data.status,
            to = %next.status,
            "Mission status changed"
        );
        self.refresh_aggregates_after_write(starship_id);
        Ok(Record {
            id: current.id,
            data: next,
        })
    }

    fn ensure_module_exists(&self, starship_id: &str, module_id: Option<&str>) -> FleetResult<()> {
        let Some(module_id) = module_id else {
            return Ok(());
        };
        if self.db.get(&paths::module(starship_id, module_id))?.is_none() {
            return Err(ValidationError::single("moduleId", "Module does not exist").into());
        }
        Ok(())
    }

    fn ensure_assignable(&self, starship_id: &str, assignee: &str) -> FleetResult<()> {
        if assignee.is_empty() || self.crew_record_for(starship_id, assignee)?.is_some() {
            return Ok(());
        }
        Err(ValidationError::single(
            "assignedTo",
            "Assigned To must reference a crew member of this starship",
        )
        .into())
    }
}
