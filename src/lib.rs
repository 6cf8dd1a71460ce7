//! Starship Command: household management over a document store.
//!
//! A household is a *starship*. Its rooms are *modules*, its chores are
//! *missions* and its members are the *crew*. A captain (parent) commissions
//! the starship, recruits crew (children) through short-lived registration
//! codes, and approves the missions the crew completes.
//!
//! - [`db`]: the document store every record lives in.
//! - [`models`]: typed records and their validation rules.
//! - [`services`]: the [`FleetService`](services::FleetService) client.
//! - [`live`]: streaming, re-validated snapshots of collections.
//! - [`api`]: the HTTP surface.

pub mod api;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod live;
pub mod models;
pub mod services;
pub mod validation;

pub use error::{FleetError, FleetResult};
