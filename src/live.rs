//! Live subscriptions to a household's collections.
//!
//! A subscription yields a full, re-validated snapshot first and then a new
//! snapshot every time a document it covers is written or deleted. If any
//! record in a snapshot fails validation the whole snapshot is delivered as
//! an error; records are never silently dropped. A subscriber that falls too
//! far behind the change feed simply re-reads its snapshot.
//!
//! Dropping a subscription unsubscribes it.

use std::marker::PhantomData;

use futures::Stream;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;

use crate::db::{paths, Database, DocumentChange};
use crate::error::FleetResult;
use crate::models::{Crew, Mission, Module, Record, Starship};
use crate::services::FleetService;
use crate::validation::{self, Validate};

/// Every record of one collection, in store order.
pub type Snapshot<T> = FleetResult<Vec<Record<T>>>;

/// Follows one collection (modules, missions or crew) of a starship.
pub struct CollectionSubscription<T> {
    db: Database,
    locate: fn(&str) -> String,
    starship_id: String,
    collection: String,
    feed: Receiver<DocumentChange>,
    primed: bool,
    _record: PhantomData<fn() -> T>,
}

impl<T> CollectionSubscription<T>
where
    T: DeserializeOwned + Validate,
{
    fn new(db: Database, starship_id: &str, locate: fn(&str) -> String) -> Self {
        let feed = db.watch();
        Self {
            db,
            locate,
            starship_id: starship_id.to_string(),
            collection: locate(starship_id),
            feed,
            primed: false,
            _record: PhantomData,
        }
    }

    pub fn starship_id(&self) -> &str {
        &self.starship_id
    }

    /// Wait for the next snapshot. The first call returns immediately with
    /// the current contents. `None` means the store has gone away.
    pub async fn next(&mut self) -> Option<Snapshot<T>> {
        if !self.primed {
            self.primed = true;
            return Some(self.snapshot());
        }
        loop {
            match self.feed.recv().await {
                Ok(change) if change.collection == self.collection => {
                    return Some(self.snapshot());
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(collection = %self.collection, skipped, "Change feed lagged, re-reading");
                    return Some(self.snapshot());
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Stop following the current starship and follow `starship_id`
    /// instead. The next call to [`next`](Self::next) yields its initial
    /// snapshot.
    pub fn switch_starship(&mut self, starship_id: &str) {
        self.starship_id = starship_id.to_string();
        self.collection = (self.locate)(starship_id);
        self.feed = self.db.watch();
        self.primed = false;
    }

    /// The current contents, read straight from the store.
    pub fn snapshot(&self) -> Snapshot<T> {
        let docs = self.db.list(&self.collection)?;
        let records = docs
            .into_iter()
            .map(|doc| validation::decode(&doc.id, doc.data))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn into_stream(self) -> impl Stream<Item = Snapshot<T>> + Send
    where
        T: Send + 'static,
    {
        futures::stream::unfold(self, |mut sub| async move {
            sub.next().await.map(|snapshot| (snapshot, sub))
        })
    }
}

/// Follows a single document, such as the starship record itself.
pub struct DocumentSubscription<T> {
    db: Database,
    locate: fn(&str) -> String,
    path: String,
    feed: Receiver<DocumentChange>,
    primed: bool,
    _record: PhantomData<fn() -> T>,
}

impl<T> DocumentSubscription<T>
where
    T: DeserializeOwned + Validate,
{
    fn new(db: Database, id: &str, locate: fn(&str) -> String) -> Self {
        let feed = db.watch();
        Self {
            db,
            locate,
            path: locate(id),
            feed,
            primed: false,
            _record: PhantomData,
        }
    }

    /// Like [`CollectionSubscription::next`]. A deleted or missing document
    /// comes through as `Ok(None)`.
    pub async fn next(&mut self) -> Option<FleetResult<Option<Record<T>>>> {
        if !self.primed {
            self.primed = true;
            return Some(self.snapshot());
        }
        loop {
            match self.feed.recv().await {
                Ok(change) if change.path == self.path => return Some(self.snapshot()),
                Ok(_) => continue,
                Err(RecvError::Lagged(_)) => return Some(self.snapshot()),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    pub fn switch_starship(&mut self, starship_id: &str) {
        self.path = (self.locate)(starship_id);
        self.feed = self.db.watch();
        self.primed = false;
    }

    pub fn snapshot(&self) -> FleetResult<Option<Record<T>>> {
        match self.db.get(&self.path)? {
            Some(doc) => Ok(Some(validation::decode(&doc.id, doc.data)?)),
            None => Ok(None),
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = FleetResult<Option<Record<T>>>> + Send
    where
        T: Send + 'static,
    {
        futures::stream::unfold(self, |mut sub| async move {
            sub.next().await.map(|snapshot| (snapshot, sub))
        })
    }
}

impl FleetService {
    pub fn watch_modules(&self, starship_id: &str) -> CollectionSubscription<Module> {
        CollectionSubscription::new(self.db().clone(), starship_id, paths::modules)
    }

    pub fn watch_missions(&self, starship_id: &str) -> CollectionSubscription<Mission> {
        CollectionSubscription::new(self.db().clone(), starship_id, paths::missions)
    }

    pub fn watch_crew(&self, starship_id: &str) -> CollectionSubscription<Crew> {
        CollectionSubscription::new(self.db().clone(), starship_id, paths::crew)
    }

    pub fn watch_starship(&self, starship_id: &str) -> DocumentSubscription<Starship> {
        DocumentSubscription::new(self.db().clone(), starship_id, paths::starship)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service() -> FleetService {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        FleetService::with_defaults(db)
    }

    #[tokio::test]
    async fn first_snapshot_is_immediate() {
        let service = service();
        service
            .db()
            .set(
                "api/v1/starships/S1/modules/m1",
                &json!({"name": "Bridge", "realWorldRoom": "Kitchen", "incompleteMissions": []}),
            )
            .unwrap();

        let mut sub = service.watch_modules("S1");
        let modules = sub.next().await.unwrap().unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].id, "m1");
    }

    #[tokio::test]
    async fn other_households_do_not_wake_subscribers() {
        let service = service();
        let mut sub = service.watch_modules("S1");
        sub.next().await.unwrap().unwrap();

        let module = json!({"name": "Bridge", "realWorldRoom": "Kitchen", "incompleteMissions": []});
        service.db().set("api/v1/starships/S2/modules/m1", &module).unwrap();
        service.db().set("api/v1/starships/S1/modules/m2", &module).unwrap();

        let modules = sub.next().await.unwrap().unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].id, "m2");
    }
}
