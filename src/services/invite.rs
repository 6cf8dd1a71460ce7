//! Registration codes: recruiting placeholders and joining with a code.
//!
//! A captain recruits a crew member before that person has an account. The
//! placeholder record carries a short-lived six character code. Whoever
//! redeems the code first is bound to the record; the code is cleared in
//! the same conditional write, so it can only ever be used once.

use rand::thread_rng;
use serde_json::json;

use super::FleetService;
use crate::db::paths;
use crate::error::{FleetError, FleetResult};
use crate::models::{
    generate_registration_code, normalize_code, Crew, CrewRole, CrewStatus, IssuedCode,
    JoinOutcome, QrPayload, RecruitCrewInput, RecruitResult, Record, RedeemCodeInput,
};
use crate::validation::Validate;

impl FleetService {
    /// Create a placeholder crew record with a fresh registration code.
    /// Captain only.
    pub fn recruit_crew(
        &self,
        starship_id: &str,
        actor: Option<&str>,
        input: RecruitCrewInput,
    ) -> FleetResult<RecruitResult> {
        self.require_captain(starship_id, actor)?;

        let now = self.now_ms();
        let code = generate_registration_code(&mut thread_rng());
        let expiry = self.config.invite_expiry(now);
        let crew = Crew {
            uid: String::new(),
            name: input.name,
            role: CrewRole::Crew,
            credits: 0,
            xp: 0,
            level: 1,
            created_date: now,
            registration_code: code.clone(),
            registration_code_expiry: expiry,
            status: CrewStatus::Pending,
            last_seen: 0,
        };
        crew.validate()?;

        let crew = self.insert(&paths::crew(starship_id), crew)?;
        tracing::info!(%starship_id, crew_id = %crew.id, "Crew member recruited");

        let registration = issued(starship_id, &crew.id, code, expiry);
        Ok(RecruitResult { crew, registration })
    }

    /// Replace a crew record's code with a new one and restart its expiry.
    /// Captain only. The write only lands while the record is still unclaimed.
    pub fn refresh_registration_code(
        &self,
        starship_id: &str,
        crew_id: &str,
        actor: Option<&str>,
    ) -> FleetResult<IssuedCode> {
        self.require_captain(starship_id, actor)?;

        let crew = self.get_crew_member(starship_id, crew_id)?;
        if crew.data.has_joined() {
            return Err(FleetError::Conflict(format!(
                "{} has already joined",
                crew.data.name
            )));
        }

        let code = generate_registration_code(&mut thread_rng());
        let expiry = self.config.invite_expiry(self.now_ms());
        let path = paths::crew_member(starship_id, crew_id);
        let stored = self.db.merge_if(
            &path,
            "uid",
            "",
            &json!({
                "registrationCode": code,
                "registrationCodeExpiry": expiry,
            }),
        )?;
        if !stored {
            return match self.read::<Crew>(&path)? {
                None => Err(FleetError::NotFound("Crew member".to_string())),
                Some(_) => Err(FleetError::Conflict(format!(
                    "{} joined while the code was being refreshed",
                    crew.data.name
                ))),
            };
        }

        tracing::info!(%starship_id, %crew_id, "Registration code refreshed");
        Ok(issued(starship_id, crew_id, code, expiry))
    }

    /// Bind the redeemer to the crew record holding `code`.
    ///
    /// The code is compared after trimming and uppercasing. The write is
    /// conditional on the code still being in place; a redeemer who loses
    /// that race sees [`FleetError::InvalidCode`], exactly as if the code
    /// had never existed. Linking the redeemer's directory mapping happens
    /// afterwards and is best-effort.
    pub fn redeem_registration_code(
        &self,
        redeemer: Option<&str>,
        input: RedeemCodeInput,
    ) -> FleetResult<JoinOutcome> {
        let uid = redeemer
            .filter(|u| !u.is_empty())
            .ok_or(FleetError::AuthenticationRequired)?;

        let code = normalize_code(&input.code);
        if code.is_empty() || input.starship_id.is_empty() {
            return Err(FleetError::InvalidCode);
        }
        let starship_id = input.starship_id.as_str();

        let crew = match input.crew_id.as_deref().filter(|c| !c.is_empty()) {
            Some(crew_id) => self.read::<Crew>(&paths::crew_member(starship_id, crew_id))?,
            None => self.crew_by_code(starship_id, &code)?,
        };
        let crew = crew
            .filter(|c| c.data.has_open_code() && c.data.registration_code == code)
            .ok_or(FleetError::InvalidCode)?;

        if crew.data.registration_code_expiry < self.now_ms() {
            tracing::warn!(%starship_id, crew_id = %crew.id, "Expired registration code presented");
            return Err(FleetError::CodeExpired);
        }

        let path = paths::crew_member(starship_id, &crew.id);
        let claimed = self.db.merge_if(
            &path,
            "registrationCode",
            &code,
            &json!({
                "uid": uid,
                "status": CrewStatus::Stable,
                "registrationCode": "",
                "registrationCodeExpiry": 0,
                "lastSeen": self.now_ms(),
            }),
        )?;
        if !claimed {
            return Err(FleetError::InvalidCode);
        }

        if let Err(e) = self.link_user_to_starship(uid, starship_id) {
            tracing::warn!(uid, %starship_id, "Error linking user to starship: {}", e);
        }

        tracing::info!(uid, %starship_id, crew_id = %crew.id, "Registration code redeemed");
        Ok(JoinOutcome {
            starship_id: starship_id.to_string(),
            crew: self.get_crew_member(starship_id, &crew.id)?,
        })
    }

    fn crew_by_code(&self, starship_id: &str, code: &str) -> FleetResult<Option<Record<Crew>>> {
        let docs = self
            .db
            .find_where(&paths::crew(starship_id), "registrationCode", code, 1)?;
        match docs.into_iter().next() {
            Some(doc) => Ok(Some(super::decode(doc)?)),
            None => Ok(None),
        }
    }
}

fn issued(starship_id: &str, crew_id: &str, code: String, expiry: i64) -> IssuedCode {
    let qr = QrPayload {
        starship_id: starship_id.to_string(),
        crew_id: crew_id.to_string(),
        code: code.clone(),
    }
    .encode();
    IssuedCode {
        crew_id: crew_id.to_string(),
        code,
        expiry,
        qr,
    }
}
