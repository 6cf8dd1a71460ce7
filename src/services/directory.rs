//! Household directory: which starship does a user belong to?
//!
//! Resolution is three-tiered, first match wins:
//!
//! 1. the `userStarships/{uid}` mapping (a point read),
//! 2. a starship whose `primaryCaptainId` is the user,
//! 3. a crew record, in any household, bound to the user.
//!
//! If nothing matches, the user's own id is used: a brand-new captain's
//! starship will be commissioned under that id. Any resolution that did not
//! come from the mapping is written back as a mapping so the next lookup
//! is a point read. That write is best-effort.

use serde::{Deserialize, Serialize};

use super::FleetService;
use crate::db::paths;
use crate::error::{FleetError, FleetResult};
use crate::models::{Record, Starship, UserStarship};
use crate::validation::Validate;

/// Which tier resolved the lookup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverySource {
    Mapping,
    Captain,
    Crew,
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Discovery {
    pub starship_id: String,
    pub source: DiscoverySource,
}

impl FleetService {
    /// Resolve the signed-in user's starship.
    ///
    /// Only a missing identity is an error. Failures inside a tier are
    /// logged and the next tier is tried.
    pub fn discover_starship(&self, uid: Option<&str>) -> FleetResult<Discovery> {
        let uid = uid
            .filter(|u| !u.is_empty())
            .ok_or(FleetError::AuthenticationRequired)?;

        match self.starship_id_for_user(uid) {
            Ok(Some(starship_id)) => {
                tracing::debug!(uid, %starship_id, "Starship resolved from mapping");
                return Ok(Discovery {
                    starship_id,
                    source: DiscoverySource::Mapping,
                });
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(uid, "Mapping lookup failed: {}", e),
        }

        let resolved = match self.starship_by_captain(uid) {
            Ok(Some(starship)) => Some((starship.id, DiscoverySource::Captain)),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(uid, "Captain lookup failed: {}", e);
                None
            }
        };

        let resolved = match resolved {
            Some(found) => Some(found),
            None => match self.starship_by_crew_uid(uid) {
                Ok(Some(starship_id)) => Some((starship_id, DiscoverySource::Crew)),
                Ok(None) => None,
                Err(e) => {
                    tracing::warn!(uid, "Crew lookup failed: {}", e);
                    None
                }
            },
        };

        let (starship_id, source) =
            resolved.unwrap_or_else(|| (uid.to_string(), DiscoverySource::Fallback));

        if let Err(e) = self.link_user_to_starship(uid, &starship_id) {
            tracing::warn!(uid, %starship_id, "Error linking user to starship: {}", e);
        }

        tracing::info!(uid, %starship_id, ?source, "Starship discovered");
        Ok(Discovery {
            starship_id,
            source,
        })
    }

    /// Write the `userStarships/{uid}` shortcut.
    pub fn link_user_to_starship(&self, uid: &str, starship_id: &str) -> FleetResult<()> {
        let mapping = UserStarship {
            starship_id: starship_id.to_string(),
        };
        mapping.validate()?;
        self.db
            .set(&paths::user_starship(uid), &serde_json::to_value(&mapping)?)?;
        Ok(())
    }

    /// Tier 1: the stored mapping, if any.
    pub fn starship_id_for_user(&self, uid: &str) -> FleetResult<Option<String>> {
        let mapping = self.read::<UserStarship>(&paths::user_starship(uid))?;
        Ok(mapping.map(|m| m.data.starship_id))
    }

    /// Tier 2: the starship this user captains.
    pub fn starship_by_captain(&self, uid: &str) -> FleetResult<Option<Record<Starship>>> {
        let docs = self
            .db
            .find_where(&paths::starships(), "primaryCaptainId", uid, 1)?;
        match docs.into_iter().next() {
            Some(doc) => Ok(Some(super::decode(doc)?)),
            None => Ok(None),
        }
    }

    /// Tier 3: the starship holding a crew record bound to this user.
    pub fn starship_by_crew_uid(&self, uid: &str) -> FleetResult<Option<String>> {
        let docs = self.db.find_in_group(paths::CREW, "uid", uid, 1)?;
        Ok(docs.into_iter().next().and_then(|doc| {
            paths::split(&doc.path)
                .and_then(|(collection, _)| paths::starship_of(collection))
                .map(str::to_string)
        }))
    }
}
