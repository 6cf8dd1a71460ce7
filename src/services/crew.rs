use serde_json::json;

use super::FleetService;
use crate::db::paths;
use crate::error::{FleetError, FleetResult};
use crate::models::{Crew, CrewRole, CrewStatus, Record, Starship, UpdateCrewInput};

impl FleetService {
    /// The full roster, placeholders included.
    pub fn list_crew(&self, starship_id: &str) -> FleetResult<Vec<Record<Crew>>> {
        self.read_all(&paths::crew(starship_id))
    }

    pub fn get_crew_member(&self, starship_id: &str, crew_id: &str) -> FleetResult<Record<Crew>> {
        self.require(&paths::crew_member(starship_id, crew_id), "Crew member")
    }

    /// The crew record bound to `uid` in this starship, if any.
    pub fn crew_record_for(&self, starship_id: &str, uid: &str) -> FleetResult<Option<Record<Crew>>> {
        if uid.is_empty() {
            return Ok(None);
        }
        let docs = self.db.find_where(&paths::crew(starship_id), "uid", uid, 1)?;
        match docs.into_iter().next() {
            Some(doc) => Ok(Some(super::decode(doc)?)),
            None => Ok(None),
        }
    }

    /// The role `uid` holds aboard this starship, or `None` for outsiders.
    ///
    /// The starship's primary captain is always a captain, even if their
    /// crew record is missing.
    pub fn member_role(&self, starship_id: &str, uid: &str) -> FleetResult<Option<CrewRole>> {
        if let Some(crew) = self.crew_record_for(starship_id, uid)? {
            return Ok(Some(crew.data.role));
        }
        let starship = self.read::<Starship>(&paths::starship(starship_id))?;
        Ok(starship
            .filter(|s| !uid.is_empty() && s.data.primary_captain_id == uid)
            .map(|_| CrewRole::Captain))
    }

    /// Fails unless `uid` is signed in and belongs to this starship.
    pub(crate) fn require_member(&self, starship_id: &str, uid: Option<&str>) -> FleetResult<(String, CrewRole)> {
        let uid = uid
            .filter(|u| !u.is_empty())
            .ok_or(FleetError::AuthenticationRequired)?;
        match self.member_role(starship_id, uid)? {
            Some(role) => Ok((uid.to_string(), role)),
            None => Err(FleetError::Forbidden(
                "Not a member of this starship".to_string(),
            )),
        }
    }

    /// Fails unless `uid` is a captain of this starship.
    pub(crate) fn require_captain(&self, starship_id: &str, uid: Option<&str>) -> FleetResult<String> {
        let (uid, role) = self.require_member(starship_id, uid)?;
        if role != CrewRole::Captain {
            return Err(FleetError::Forbidden(
                "Only a captain can do that".to_string(),
            ));
        }
        Ok(uid)
    }

    /// Apply a partial update to a crew member. Captain only.
    pub fn update_crew_member(
        &self,
        starship_id: &str,
        crew_id: &str,
        actor: Option<&str>,
        input: UpdateCrewInput,
    ) -> FleetResult<Record<Crew>> {
        self.require_captain(starship_id, actor)?;
        self.patch(&paths::crew_member(starship_id, crew_id), &input, "Crew member")?;
        self.get_crew_member(starship_id, crew_id)
    }

    /// Mark the caller's own crew record as seen just now.
    pub fn record_presence(&self, starship_id: &str, uid: Option<&str>) -> FleetResult<Record<Crew>> {
        let uid = uid
            .filter(|u| !u.is_empty())
            .ok_or(FleetError::AuthenticationRequired)?;
        let crew = self
            .crew_record_for(starship_id, uid)?
            .ok_or_else(|| FleetError::NotFound("Crew member".to_string()))?;

        self.db.merge(
            &paths::crew_member(starship_id, &crew.id),
            &json!({
                "status": CrewStatus::Stable,
                "lastSeen": self.now_ms(),
            }),
        )?;
        self.get_crew_member(starship_id, &crew.id)
    }
}
