use std::time::Duration;

use futures::StreamExt;
use serde_json::json;
use starship_command::db::{paths, Database};
use starship_command::models::*;
use starship_command::services::FleetService;
use starship_command::FleetError;

const CAPTAIN: &str = "captain-1";

fn setup() -> (FleetService, String) {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let service = FleetService::with_defaults(db);
    let starship = service
        .commission_starship(
            Some(CAPTAIN),
            CommissionStarshipInput {
                name: "Endeavour".to_string(),
                captain_name: "Dana".to_string(),
            },
        )
        .expect("Failed to commission");
    (service, starship.id)
}

fn galley() -> CreateModuleInput {
    CreateModuleInput {
        name: "Galley".to_string(),
        real_world_room: "Kitchen".to_string(),
        icon: None,
    }
}

/// Fails the test instead of hanging when no snapshot arrives.
async fn within<F: std::future::Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(2), future)
        .await
        .expect("Timed out waiting for a snapshot")
}

mod collections {
    use super::*;

    #[tokio::test]
    async fn yields_the_current_contents_then_every_change() {
        let (service, sid) = setup();
        let mut sub = service.watch_modules(&sid);

        let initial = within(sub.next()).await.unwrap().unwrap();
        assert!(initial.is_empty());

        let added = service.add_module(&sid, Some(CAPTAIN), galley()).unwrap();
        let after_add = within(sub.next()).await.unwrap().unwrap();
        assert_eq!(after_add.len(), 1);
        assert_eq!(after_add[0].id, added.id);

        service.delete_module(&sid, &added.id, Some(CAPTAIN)).unwrap();
        let after_delete = within(sub.next()).await.unwrap().unwrap();
        assert!(after_delete.is_empty());
    }

    #[tokio::test]
    async fn a_single_invalid_record_fails_the_whole_snapshot() {
        let (service, sid) = setup();
        service.add_module(&sid, Some(CAPTAIN), galley()).unwrap();
        let mut sub = service.watch_modules(&sid);
        within(sub.next()).await.unwrap().unwrap();

        service
            .db()
            .set(&paths::module(&sid, "broken"), &json!({"name": "", "realWorldRoom": "Attic"}))
            .unwrap();

        let snapshot = within(sub.next()).await.unwrap();
        assert!(matches!(snapshot, Err(FleetError::Validation(_))));

        service.db().delete(&paths::module(&sid, "broken")).unwrap();
        let recovered = within(sub.next()).await.unwrap().unwrap();
        assert_eq!(recovered.len(), 1);
    }

    #[tokio::test]
    async fn switching_starships_re_targets_the_subscription() {
        let (service, sid) = setup();
        let other = service
            .commission_starship(
                Some("captain-2"),
                CommissionStarshipInput {
                    name: "Defiant".to_string(),
                    captain_name: "Sam".to_string(),
                },
            )
            .unwrap();
        service.add_module(&other.id, Some("captain-2"), galley()).unwrap();

        let mut sub = service.watch_modules(&sid);
        assert!(within(sub.next()).await.unwrap().unwrap().is_empty());

        sub.switch_starship(&other.id);
        assert_eq!(sub.starship_id(), other.id);
        let switched = within(sub.next()).await.unwrap().unwrap();
        assert_eq!(switched.len(), 1);

        service.add_module(&sid, Some(CAPTAIN), galley()).unwrap();
        service.add_module(&other.id, Some("captain-2"), galley()).unwrap();
        let next = within(sub.next()).await.unwrap().unwrap();
        assert_eq!(next.len(), 2);
    }

    #[tokio::test]
    async fn mission_streams_follow_the_lifecycle() {
        let (service, sid) = setup();
        let mission = service
            .add_mission(
                &sid,
                Some(CAPTAIN),
                CreateMissionInput {
                    title: "Dishes".to_string(),
                    description: String::new(),
                    credit_reward: 20,
                    difficulty: MissionDifficulty::Easy,
                    module_id: None,
                    assigned_to: None,
                },
            )
            .unwrap();

        let mut stream = Box::pin(service.watch_missions(&sid).into_stream());
        let initial = within(stream.next()).await.unwrap().unwrap();
        assert_eq!(initial[0].data.status, MissionStatus::Pending);

        service.claim_mission(&sid, &mission.id, Some(CAPTAIN)).unwrap();
        let claimed = within(stream.next()).await.unwrap().unwrap();
        assert_eq!(claimed[0].data.status, MissionStatus::Active);
        assert_eq!(claimed[0].data.assigned_to, CAPTAIN);
    }
}

mod documents {
    use super::*;

    #[tokio::test]
    async fn follows_the_starship_record() {
        let (service, sid) = setup();
        let mut sub = service.watch_starship(&sid);

        let initial = within(sub.next()).await.unwrap().unwrap().unwrap();
        assert_eq!(initial.data.hull_integrity, 100);

        service.set_hull_integrity(&sid, Some(CAPTAIN), 30).unwrap();
        let updated = within(sub.next()).await.unwrap().unwrap().unwrap();
        assert_eq!(updated.data.hull_integrity, 30);
        assert_eq!(updated.data.status, StarshipStatus::Critical);
    }

    #[tokio::test]
    async fn missing_starships_come_through_as_none() {
        let (service, _) = setup();
        let mut sub = service.watch_starship("nowhere");
        assert!(within(sub.next()).await.unwrap().unwrap().is_none());
    }
}
