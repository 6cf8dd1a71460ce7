//! The fleet service client.
//!
//! [`FleetService`] is constructed with the store handle, a clock and the
//! configuration; it holds no other state between calls. Each submodule
//! adds one area of operations:
//!
//! - [`directory`]: resolving a user to their starship
//! - [`starships`]: commissioning and updating households, aggregates
//! - [`modules`]: rooms
//! - [`missions`]: chores and their lifecycle
//! - [`crew`]: the roster
//! - [`invite`]: registration codes and joining

pub mod crew;
pub mod directory;
pub mod invite;
pub mod missions;
pub mod modules;
pub mod starships;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::clock::{Clock, SystemClock};
use crate::config::FleetConfig;
use crate::db::{Database, StoredDocument};
use crate::error::{FleetError, FleetResult};
use crate::models::Record;
use crate::validation::{self, Validate};

#[derive(Clone, Debug)]
pub struct FleetService {
    db: Database,
    clock: Arc<dyn Clock>,
    config: FleetConfig,
}

impl FleetService {
    pub fn new(db: Database, clock: Arc<dyn Clock>, config: FleetConfig) -> Self {
        Self { db, clock, config }
    }

    /// A service on the system clock with default configuration.
    pub fn with_defaults(db: Database) -> Self {
        Self::new(db, Arc::new(SystemClock), FleetConfig::default())
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    // ============================================================
    // Typed access shared by the submodules
    // ============================================================

    /// Read and validate the document at `path`.
    fn read<T>(&self, path: &str) -> FleetResult<Option<Record<T>>>
    where
        T: DeserializeOwned + Validate,
    {
        match self.db.get(path)? {
            Some(doc) => Ok(Some(decode(doc)?)),
            None => Ok(None),
        }
    }

    /// Read and validate a document that must exist.
    fn require<T>(&self, path: &str, what: &str) -> FleetResult<Record<T>>
    where
        T: DeserializeOwned + Validate,
    {
        self.read(path)?
            .ok_or_else(|| FleetError::NotFound(what.to_string()))
    }

    /// Read and validate every document in `collection`.
    fn read_all<T>(&self, collection: &str) -> FleetResult<Vec<Record<T>>>
    where
        T: DeserializeOwned + Validate,
    {
        self.db
            .list(collection)?
            .into_iter()
            .map(|doc| decode(doc).map_err(FleetError::from))
            .collect()
    }

    /// Validate a full record and write it under a generated id.
    fn insert<T>(&self, collection: &str, value: T) -> FleetResult<Record<T>>
    where
        T: Serialize + Validate,
    {
        value.validate()?;
        let id = self.db.add(collection, &serde_json::to_value(&value)?)?;
        Ok(Record { id, data: value })
    }

    /// Validate a partial update and merge it into an existing document.
    fn patch<U>(&self, path: &str, update: &U, what: &str) -> FleetResult<()>
    where
        U: Serialize + Validate,
    {
        update.validate()?;
        let fields = serde_json::to_value(update)?;
        if is_empty_object(&fields) {
            return if self.db.get(path)?.is_some() {
                Ok(())
            } else {
                Err(FleetError::NotFound(what.to_string()))
            };
        }
        if self.db.merge(path, &fields)? {
            Ok(())
        } else {
            Err(FleetError::NotFound(what.to_string()))
        }
    }
}

fn decode<T>(doc: StoredDocument) -> Result<Record<T>, validation::ValidationError>
where
    T: DeserializeOwned + Validate,
{
    validation::decode(&doc.id, doc.data)
}

fn is_empty_object(value: &Value) -> bool {
    value.as_object().is_some_and(|o| o.is_empty())
}
