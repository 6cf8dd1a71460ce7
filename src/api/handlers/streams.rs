//! Server-sent event streams over live subscriptions.
//!
//! Each stream opens with a `snapshot` event holding the current contents
//! and sends another after every change. A snapshot that fails validation
//! is sent as an `error` event and the stream stays open.

use std::convert::Infallible;
use std::pin::Pin;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, KeepAliveStream, Sse},
};
use futures::{Stream, StreamExt};
use serde::Serialize;

use super::{member_of, ApiResult, Identity};
use crate::error::FleetResult;
use crate::services::FleetService;

type EventStream =
    Sse<KeepAliveStream<Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>>>;

pub async fn stream_starship(
    State(service): State<FleetService>,
    Path(starship_id): Path<String>,
    identity: Identity,
) -> ApiResult<EventStream> {
    member_of(&service, &starship_id, &identity)?;
    Ok(sse(service.watch_starship(&starship_id).into_stream()))
}

pub async fn stream_modules(
    State(service): State<FleetService>,
    Path(starship_id): Path<String>,
    identity: Identity,
) -> ApiResult<EventStream> {
    member_of(&service, &starship_id, &identity)?;
    Ok(sse(service.watch_modules(&starship_id).into_stream()))
}

pub async fn stream_missions(
    State(service): State<FleetService>,
    Path(starship_id): Path<String>,
    identity: Identity,
) -> ApiResult<EventStream> {
    member_of(&service, &starship_id, &identity)?;
    Ok(sse(service.watch_missions(&starship_id).into_stream()))
}

pub async fn stream_crew(
    State(service): State<FleetService>,
    Path(starship_id): Path<String>,
    identity: Identity,
) -> ApiResult<EventStream> {
    member_of(&service, &starship_id, &identity)?;
    Ok(sse(service.watch_crew(&starship_id).into_stream()))
}

fn sse<S, T>(snapshots: S) -> EventStream
where
    S: Stream<Item = FleetResult<T>> + Send + 'static,
    T: Serialize + 'static,
{
    let events = snapshots.map(|snapshot| Ok(snapshot_event(snapshot)));
    Sse::new(events.boxed()).keep_alive(KeepAlive::default())
}

fn snapshot_event<T: Serialize>(snapshot: FleetResult<T>) -> Event {
    match snapshot {
        Ok(data) => Event::default()
            .event("snapshot")
            .json_data(&data)
            .unwrap_or_else(|e| Event::default().event("error").data(e.to_string())),
        Err(e) => {
            tracing::warn!("Live snapshot failed: {}", e);
            Event::default().event("error").data(e.to_string())
        }
    }
}
