//! Overlay loader: fetches the redlining feature collection.

use std::sync::Arc;

use redline_common::{BoundingBox, FetchError, MapService, Overlay, ServiceResponse};
use redline_common::wire::Envelope;
use serde_json::Value;

/// What to fetch. Exactly one mode per request.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayQuery {
    /// Every feature lying inside the box (`getData`).
    Bounds(BoundingBox),
    /// Every feature whose area description mentions the keyword (`getArea`).
    Keyword(String),
}

impl OverlayQuery {
    pub fn world() -> Self {
        OverlayQuery::Bounds(BoundingBox::WORLD)
    }

    pub fn keyword(keyword: impl Into<String>) -> Self {
        OverlayQuery::Keyword(keyword.into())
    }
}

impl From<BoundingBox> for OverlayQuery {
    fn from(bounds: BoundingBox) -> Self {
        OverlayQuery::Bounds(bounds)
    }
}

pub struct OverlayLoader<S> {
    service: Arc<S>,
}

impl<S> Clone for OverlayLoader<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

impl<S: MapService> OverlayLoader<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }

    /// Fetch the overlay for `query`.
    ///
    /// `Ok(None)` means the service answered 200 with something that isn't a
    /// feature collection; the view treats that as "no overlay" rather than
    /// an error.
    pub async fn fetch_overlay(&self, query: OverlayQuery) -> Result<Option<Overlay>, FetchError> {
        let response = match &query {
            OverlayQuery::Bounds(bounds) => {
                tracing::debug!(?bounds, "fetching overlay");
                self.service.get_data(bounds).await?
            }
            OverlayQuery::Keyword(keyword) => {
                if keyword.trim().is_empty() {
                    return Err(FetchError::EmptyKeyword);
                }
                tracing::debug!(%keyword, "searching overlay");
                self.service.get_area(keyword).await?
            }
        };
        decode_overlay(&response)
    }
}

fn decode_overlay(response: &ServiceResponse) -> Result<Option<Overlay>, FetchError> {
    match response.status {
        200..=299 => {}
        404 => {
            return Err(FetchError::NotFound {
                message: response.error_message(),
            });
        }
        status => {
            return Err(FetchError::failed(format!("unexpected status {status}")));
        }
    }

    let value = response.value()?;
    Envelope::check(&value)?;

    if value.get("type").and_then(Value::as_str) != Some(redline_common::overlay::FEATURE_COLLECTION)
    {
        tracing::warn!(
            kind = ?value.get("type"),
            "overlay response is not a FeatureCollection, treating as absent"
        );
        return Ok(None);
    }

    match serde_json::from_value::<Overlay>(value) {
        Ok(overlay) => Ok(Some(overlay)),
        Err(e) => {
            tracing::warn!(error = %e, "overlay features failed to decode, treating as absent");
            Ok(None)
        }
    }
}
