use chrono::Utc;
use serde_json::json;

use super::FleetService;
use crate::db::paths;
use crate::error::{FleetError, FleetResult};
use crate::models::{
    CommissionStarshipInput, Crew, CrewRole, CrewStatus, Mission, MissionRef, Module, Record,
    Starship, StarshipStatus, UpdateStarshipInput,
};
use crate::validation::{Validate, ValidationError};

/// Hull integrity of a freshly commissioned starship.
const INITIAL_HULL_INTEGRITY: i64 = 100;

impl FleetService {
    /// Commission a starship for `captain_uid`.
    ///
    /// The starship is stored under the captain's own id, which is also what
    /// discovery falls back to for a user with no household yet. The
    /// captain's crew record and directory mapping are created alongside.
    pub fn commission_starship(
        &self,
        captain_uid: Option<&str>,
        input: CommissionStarshipInput,
    ) -> FleetResult<Record<Starship>> {
        let captain_uid = captain_uid
            .filter(|u| !u.is_empty())
            .ok_or(FleetError::AuthenticationRequired)?;

        let starship = Starship {
            primary_captain_id: captain_uid.to_string(),
            name: input.name,
            hull_integrity: INITIAL_HULL_INTEGRITY,
            incomplete_mission_count: 0,
            status: StarshipStatus::Nominal,
            last_update: Utc::now(),
        };
        starship.validate()?;

        let now = self.now_ms();
        let captain = Crew {
            uid: captain_uid.to_string(),
            name: input.captain_name,
            role: CrewRole::Captain,
            credits: 0,
            xp: 0,
            level: 1,
            created_date: now,
            registration_code: String::new(),
            registration_code_expiry: 0,
            status: CrewStatus::Stable,
            last_seen: now,
        };
        captain.validate()?;

        let starship_id = captain_uid;
        if !self
            .db
            .create(&paths::starship(starship_id), &serde_json::to_value(&starship)?)?
        {
            return Err(FleetError::AlreadyExists(format!("Starship {}", starship_id)));
        }

        self.db.set(
            &paths::crew_member(starship_id, captain_uid),
            &serde_json::to_value(&captain)?,
        )?;
        self.link_user_to_starship(captain_uid, starship_id)?;

        tracing::info!(%starship_id, name = %starship.name, "Starship commissioned");
        Ok(Record {
            id: starship_id.to_string(),
            data: starship,
        })
    }

    pub fn get_starship(&self, starship_id: &str) -> FleetResult<Record<Starship>> {
        self.require(&paths::starship(starship_id), "Starship")
    }

    /// Apply a partial update. `lastUpdate` is always refreshed and a new
    /// hull integrity brings its status along. Any member may do this.
    pub fn update_starship(
        &self,
        starship_id: &str,
        actor: Option<&str>,
        input: UpdateStarshipInput,
    ) -> FleetResult<Record<Starship>> {
        self.require_member(starship_id, actor)?;
        self.write_starship_update(starship_id, input)
    }

    fn write_starship_update(
        &self,
        starship_id: &str,
        input: UpdateStarshipInput,
    ) -> FleetResult<Record<Starship>> {
        input.validate()?;
        let mut fields = serde_json::to_value(&input)?;
        if let Some(integrity) = input.hull_integrity {
            fields["status"] = serde_json::to_value(StarshipStatus::for_hull_integrity(integrity))?;
        }
        fields["lastUpdate"] = serde_json::to_value(Utc::now())?;

        if !self.db.merge(&paths::starship(starship_id), &fields)? {
            return Err(FleetError::NotFound("Starship".to_string()));
        }
        self.get_starship(starship_id)
    }

    /// Set hull integrity and the status it implies.
    ///
    /// Out-of-range values are rejected before anything is written.
    pub fn set_hull_integrity(
        &self,
        starship_id: &str,
        actor: Option<&str>,
        integrity: i64,
    ) -> FleetResult<Record<Starship>> {
        self.require_member(starship_id, actor)?;
        if !(0..=100).contains(&integrity) {
            return Err(ValidationError::single(
                "hullIntegrity",
                "Hull integrity must be between 0 and 100",
            )
            .into());
        }
        self.write_starship_update(
            starship_id,
            UpdateStarshipInput {
                hull_integrity: Some(integrity),
                ..Default::default()
            },
        )
    }

    /// Recompute the denormalized mission aggregates: the starship's
    /// incomplete-mission count and every module's incomplete-mission list.
    pub fn refresh_aggregates(&self, starship_id: &str) -> FleetResult<()> {
        let missions: Vec<Record<Mission>> = self.read_all(&paths::missions(starship_id))?;
        let incomplete: Vec<&Record<Mission>> = missions
            .iter()
            .filter(|m| !m.data.status.is_complete())
            .collect();

        let starship_path = paths::starship(starship_id);
        if self.db.get(&starship_path)?.is_some() {
            self.db.merge(
                &starship_path,
                &json!({
                    "incompleteMissionCount": incomplete.len() as i64,
                    "lastUpdate": Utc::now(),
                }),
            )?;
        }

        let modules: Vec<Record<Module>> = self.read_all(&paths::modules(starship_id))?;
        for module in modules {
            let refs: Vec<MissionRef> = incomplete
                .iter()
                .filter(|m| m.data.module_id.as_deref() == Some(module.id.as_str()))
                .map(|m| MissionRef { id: m.id.clone() })
                .collect();

            if refs != module.data.incomplete_missions {
                self.db.merge(
                    &paths::module(starship_id, &module.id),
                    &json!({ "incompleteMissions": refs }),
                )?;
            }
        }

        Ok(())
    }

    /// Aggregates trail the write that changed them; a failure here is
    /// logged rather than failing the write.
    pub(crate) fn refresh_aggregates_after_write(&self, starship_id: &str) {
        if let Err(e) = self.refresh_aggregates(starship_id) {
            tracing::warn!(%starship_id, "Failed to refresh mission aggregates: {}", e);
        }
    }
}
