use serde_json::json;
use speculate2::speculate;
use starship_command::db::{paths, ChangeKind, Database};

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "point reads" {
        it "returns None for a missing document" {
            let doc = db.get(&paths::starship("nope")).expect("Query failed");
            assert!(doc.is_none());
        }

        it "returns what was written along with its id" {
            db.set(&paths::starship("S1"), &json!({"name": "Endeavour"})).expect("Failed to write");

            let doc = db.get(&paths::starship("S1")).expect("Query failed").expect("Missing document");
            assert_eq!(doc.id, "S1");
            assert_eq!(doc.path, "api/v1/starships/S1");
            assert_eq!(doc.data["name"], "Endeavour");
        }
    }

    describe "collections" {
        it "lists only direct children of a collection" {
            db.set(&paths::module("S1", "a"), &json!({"name": "Bridge"})).expect("Failed to write");
            db.set(&paths::module("S1", "b"), &json!({"name": "Galley"})).expect("Failed to write");
            db.set(&paths::module("S2", "c"), &json!({"name": "Brig"})).expect("Failed to write");
            db.set(&paths::starship("S1"), &json!({"name": "Endeavour"})).expect("Failed to write");

            let docs = db.list(&paths::modules("S1")).expect("Query failed");
            let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
            assert_eq!(ids, vec!["a", "b"]);
        }

        it "filters on a field and honours the limit" {
            for id in ["k1", "k2", "k3"] {
                db.set(&paths::crew_member("S1", id), &json!({"role": "crew"})).expect("Failed to write");
            }
            db.set(&paths::crew_member("S1", "cap"), &json!({"role": "captain"})).expect("Failed to write");

            let crew = db.find_where(&paths::crew("S1"), "role", "crew", 2).expect("Query failed");
            assert_eq!(crew.len(), 2);

            let captains = db.find_where(&paths::crew("S1"), "role", "captain", 10).expect("Query failed");
            assert_eq!(captains.len(), 1);
            assert_eq!(captains[0].id, "cap");
        }

        it "queries a collection group across every starship" {
            db.set(&paths::crew_member("S1", "k1"), &json!({"uid": "U1"})).expect("Failed to write");
            db.set(&paths::crew_member("S2", "k9"), &json!({"uid": "U2"})).expect("Failed to write");
            db.set(&paths::mission("S2", "m1"), &json!({"uid": "U2"})).expect("Failed to write");

            let found = db.find_in_group(paths::CREW, "uid", "U2", 5).expect("Query failed");
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].path, "api/v1/starships/S2/crew/k9");
        }
    }

    describe "writes" {
        it "create refuses to overwrite an existing document" {
            assert!(db.create(&paths::starship("S1"), &json!({"name": "First"})).expect("Write failed"));
            assert!(!db.create(&paths::starship("S1"), &json!({"name": "Second"})).expect("Write failed"));

            let doc = db.get(&paths::starship("S1")).expect("Query failed").expect("Missing document");
            assert_eq!(doc.data["name"], "First");
        }

        it "add generates distinct ids" {
            let a = db.add(&paths::missions("S1"), &json!({"title": "Dishes"})).expect("Write failed");
            let b = db.add(&paths::missions("S1"), &json!({"title": "Laundry"})).expect("Write failed");
            assert_ne!(a, b);
            assert_eq!(db.list(&paths::missions("S1")).expect("Query failed").len(), 2);
        }

        it "merge_if only writes while the precondition holds" {
            let path = paths::crew_member("S1", "k1");
            db.set(&path, &json!({"registrationCode": "AB12CD", "uid": ""})).expect("Write failed");

            let first = db.merge_if(&path, "registrationCode", "AB12CD", &json!({"uid": "U1", "registrationCode": ""}))
                .expect("Write failed");
            let second = db.merge_if(&path, "registrationCode", "AB12CD", &json!({"uid": "U2", "registrationCode": ""}))
                .expect("Write failed");

            assert!(first);
            assert!(!second);
            let doc = db.get(&path).expect("Query failed").expect("Missing document");
            assert_eq!(doc.data["uid"], "U1");
        }

        it "delete reports whether anything was removed" {
            db.set(&paths::module("S1", "a"), &json!({})).expect("Write failed");
            assert!(db.delete(&paths::module("S1", "a")).expect("Delete failed"));
            assert!(!db.delete(&paths::module("S1", "a")).expect("Delete failed"));
        }

        it "announces deletes on the change feed" {
            db.set(&paths::module("S1", "a"), &json!({})).expect("Write failed");
            let mut feed = db.watch();

            db.delete(&paths::module("S1", "a")).expect("Delete failed");

            let change = feed.try_recv().expect("No change announced");
            assert_eq!(change.kind, ChangeKind::Deleted);
            assert_eq!(change.collection, paths::modules("S1"));
        }

        it "does not announce writes that changed nothing" {
            let mut feed = db.watch();
            assert!(!db.merge(&paths::starship("ghost"), &json!({"name": "x"})).expect("Write failed"));
            assert!(feed.try_recv().is_err());
        }
    }

    describe "on disk" {
        it "keeps documents across reopening" {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let path = dir.path().join("nested").join("starship.db");

            {
                let db = Database::open(path.clone()).expect("Failed to open database");
                db.migrate().expect("Failed to run migrations");
                db.set(&paths::starship("S1"), &json!({"name": "Endeavour"})).expect("Write failed");
            }

            let reopened = Database::open(path).expect("Failed to reopen database");
            reopened.migrate().expect("Migrations should be idempotent");
            let doc = reopened.get(&paths::starship("S1")).expect("Query failed");
            assert!(doc.is_some());
        }
    }
}
