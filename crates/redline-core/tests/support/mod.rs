//! Scripted map service for controller tests.
//!
//! Each endpoint has a queue of canned replies. A reply can be immediate or
//! held until the test releases it, which is how overlapping requests are
//! forced to complete out of order. When an endpoint's queue is empty the
//! call falls through to an in-memory service.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use redline_common::{
    BoundingBox, Endpoint, FeatureCollection, FetchError, MapService, MemoryMapService, PinsBody,
    ServiceResponse, UserId,
};
use serde_json::{Value, json};
use tokio::sync::oneshot;

pub enum Reply {
    Now(ServiceResponse),
    Fail(FetchError),
    Later(oneshot::Receiver<ServiceResponse>),
}

impl Reply {
    async fn resolve(self) -> Result<ServiceResponse, FetchError> {
        match self {
            Reply::Now(response) => Ok(response),
            Reply::Fail(error) => Err(error),
            Reply::Later(rx) => rx.await.map_err(|_| FetchError::failed("reply dropped")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub endpoint: Endpoint,
    pub user: Option<UserId>,
    pub args: Vec<String>,
}

#[derive(Default)]
pub struct ScriptedService {
    inner: MemoryMapService,
    script: Mutex<HashMap<Endpoint, VecDeque<Reply>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedService {
    pub fn with_overlay(overlay: FeatureCollection) -> Self {
        Self {
            inner: MemoryMapService::new(overlay),
            ..Default::default()
        }
    }

    pub fn script(&self, endpoint: Endpoint, reply: Reply) {
        self.script
            .lock()
            .unwrap()
            .entry(endpoint)
            .or_default()
            .push_back(reply);
    }

    pub fn respond(&self, endpoint: Endpoint, status: u16, body: Value) {
        self.script(endpoint, Reply::Now(ServiceResponse::json(status, &body)));
    }

    /// Queue a reply the test completes later through the returned sender.
    pub fn hold(&self, endpoint: Endpoint) -> oneshot::Sender<ServiceResponse> {
        let (tx, rx) = oneshot::channel();
        self.script(endpoint, Reply::Later(rx));
        tx
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, endpoint: Endpoint) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .count()
    }

    pub fn inner(&self) -> &MemoryMapService {
        &self.inner
    }

    fn record(&self, endpoint: Endpoint, user: Option<&UserId>, args: &[&str]) -> Option<Reply> {
        self.calls.lock().unwrap().push(Call {
            endpoint,
            user: user.cloned(),
            args: args.iter().map(|s| s.to_string()).collect(),
        });
        self.script
            .lock()
            .unwrap()
            .get_mut(&endpoint)
            .and_then(VecDeque::pop_front)
    }
}

impl MapService for ScriptedService {
    async fn get_data(&self, bounds: &BoundingBox) -> Result<ServiceResponse, FetchError> {
        match self.record(Endpoint::GetData, None, &[]) {
            Some(reply) => reply.resolve().await,
            None => self.inner.get_data(bounds).await,
        }
    }

    async fn get_area(&self, keyword: &str) -> Result<ServiceResponse, FetchError> {
        match self.record(Endpoint::GetArea, None, &[keyword]) {
            Some(reply) => reply.resolve().await,
            None => self.inner.get_area(keyword).await,
        }
    }

    async fn get_pins(&self, user: Option<&UserId>) -> Result<ServiceResponse, FetchError> {
        match self.record(Endpoint::GetPins, user, &[]) {
            Some(reply) => reply.resolve().await,
            None => self.inner.get_pins(user).await,
        }
    }

    async fn add_pin(
        &self,
        user: &UserId,
        lat: &str,
        lng: &str,
    ) -> Result<ServiceResponse, FetchError> {
        match self.record(Endpoint::AddPin, Some(user), &[lat, lng]) {
            Some(reply) => reply.resolve().await,
            None => self.inner.add_pin(user, lat, lng).await,
        }
    }

    async fn clear_pins(&self, user: &UserId) -> Result<ServiceResponse, FetchError> {
        match self.record(Endpoint::ClearPins, Some(user), &[]) {
            Some(reply) => reply.resolve().await,
            None => self.inner.clear_pins(user).await,
        }
    }
}

pub fn pins_response<'a>(pins: impl IntoIterator<Item = (&'a str, &'a str)>) -> ServiceResponse {
    ServiceResponse::json(200, &PinsBody::new(pins).to_value())
}

/// Two Providence neighbourhoods, one graded A and one D.
pub fn providence() -> FeatureCollection {
    serde_json::from_value(json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[-71.40, 41.83], [-71.39, 41.83], [-71.39, 41.84], [-71.40, 41.83]]]]
                },
                "properties": {
                    "city": "Providence",
                    "state": "RI",
                    "holc_id": "A1",
                    "holc_grade": "A",
                    "name": "Blackstone",
                    "area_description_data": {"5": "Quiet streets near the river"}
                }
            },
            {
                "type": "Feature",
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[-71.42, 41.80], [-71.41, 41.80], [-71.41, 41.81], [-71.42, 41.80]]]]
                },
                "properties": {
                    "city": "Providence",
                    "state": "RI",
                    "holc_id": "D4",
                    "holc_grade": "D",
                    "name": "Fox Point",
                    "area_description_data": {"5": "Mills and wharves"}
                }
            }
        ]
    }))
    .unwrap()
}

/// Yield to other tasks until `done` holds.
pub async fn settle(mut done: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if done() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}
