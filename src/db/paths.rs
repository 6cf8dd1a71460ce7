//! Document paths.
//!
//! ```text
//! api/v1/starships/{starshipId}
//! api/v1/starships/{starshipId}/modules/{moduleId}
//! api/v1/starships/{starshipId}/missions/{missionId}
//! api/v1/starships/{starshipId}/crew/{crewId}
//! api/v1/userStarships/{userId}
//! ```

pub const ROOT: &str = "api/v1";

pub const MODULES: &str = "modules";
pub const MISSIONS: &str = "missions";
pub const CREW: &str = "crew";

pub fn starships() -> String {
    format!("{}/starships", ROOT)
}

pub fn starship(starship_id: &str) -> String {
    format!("{}/starships/{}", ROOT, starship_id)
}

/// A named sub-collection of a starship.
pub fn sub_collection(starship_id: &str, name: &str) -> String {
    format!("{}/{}", starship(starship_id), name)
}

pub fn modules(starship_id: &str) -> String {
    sub_collection(starship_id, MODULES)
}

pub fn module(starship_id: &str, module_id: &str) -> String {
    format!("{}/{}", modules(starship_id), module_id)
}

pub fn missions(starship_id: &str) -> String {
    sub_collection(starship_id, MISSIONS)
}

pub fn mission(starship_id: &str, mission_id: &str) -> String {
    format!("{}/{}", missions(starship_id), mission_id)
}

pub fn crew(starship_id: &str) -> String {
    sub_collection(starship_id, CREW)
}

pub fn crew_member(starship_id: &str, crew_id: &str) -> String {
    format!("{}/{}", crew(starship_id), crew_id)
}

pub fn user_starship(user_id: &str) -> String {
    format!("{}/userStarships/{}", ROOT, user_id)
}

/// The starship id owning a sub-collection path such as
/// `api/v1/starships/S1/crew`.
pub fn starship_of(collection: &str) -> Option<&str> {
    let rest = collection.strip_prefix(ROOT)?.strip_prefix("/starships/")?;
    let id = rest.split('/').next()?;
    (!id.is_empty()).then_some(id)
}

/// Split a document path into `(collection, document id)`.
pub fn split(path: &str) -> Option<(&str, &str)> {
    let (collection, id) = path.rsplit_once('/')?;
    if collection.is_empty() || id.is_empty() {
        return None;
    }
    Some((collection, id))
}

/// The last segment of a collection path, e.g. `crew`.
pub fn group_of(collection: &str) -> &str {
    collection.rsplit('/').next().unwrap_or(collection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_paths() {
        assert_eq!(crew_member("S1", "K1"), "api/v1/starships/S1/crew/K1");
        assert_eq!(user_starship("U1"), "api/v1/userStarships/U1");
    }

    #[test]
    fn splits_paths_into_collection_and_id() {
        let (collection, id) = split("api/v1/starships/S1/missions/M1").unwrap();
        assert_eq!(collection, "api/v1/starships/S1/missions");
        assert_eq!(id, "M1");
        assert_eq!(group_of(collection), "missions");
        assert_eq!(starship_of(collection), Some("S1"));
    }

    #[test]
    fn starship_of_rejects_foreign_paths() {
        assert_eq!(starship_of("api/v1/userStarships"), None);
    }
}
