//! In-process [`MapService`] for tests and offline sessions.
//!
//! Answers with the same bodies and validation messages as the real service,
//! so anything built on top can't tell the difference.

use serde_json::json;
use std::sync::Mutex;

use crate::error::FetchError;
use crate::geo::{BoundingBox, UserId};
use crate::overlay::FeatureCollection;
use crate::service::MapService;
use crate::wire::{Envelope, PinsBody, ServiceResponse};

#[derive(Debug, Clone, PartialEq)]
struct StoredPin {
    user: UserId,
    lat: String,
    lng: String,
}

#[derive(Debug, Default)]
pub struct MemoryMapService {
    overlay: FeatureCollection,
    pins: Mutex<Vec<StoredPin>>,
}

impl MemoryMapService {
    pub fn new(overlay: FeatureCollection) -> Self {
        Self {
            overlay,
            pins: Mutex::new(Vec::new()),
        }
    }

    /// Number of stored pins across all users.
    pub fn pin_count(&self) -> usize {
        self.pins.lock().map(|pins| pins.len()).unwrap_or(0)
    }

    fn list(&self, user: Option<&UserId>) -> Vec<(String, String)> {
        let Ok(pins) = self.pins.lock() else {
            return Vec::new();
        };
        pins.iter()
            .filter(|pin| user.is_none_or(|user| &pin.user == user))
            .map(|pin| (pin.lat.clone(), pin.lng.clone()))
            .collect()
    }

    fn store(&self, user: &UserId, lat: &str, lng: &str) -> Result<(), String> {
        let latitude: f64 = lat
            .parse()
            .map_err(|_| "Latitude and longitude must be valid numbers".to_string())?;
        let longitude: f64 = lng
            .parse()
            .map_err(|_| "Latitude and longitude must be valid numbers".to_string())?;
        if !(-90.0..=90.0).contains(&latitude) {
            return Err("Latitude must be between -90 and 90".to_string());
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err("Longitude must be between -180 and 180".to_string());
        }
        let mut pins = self
            .pins
            .lock()
            .map_err(|_| "pin store unavailable".to_string())?;
        pins.push(StoredPin {
            user: user.clone(),
            lat: lat.to_string(),
            lng: lng.to_string(),
        });
        Ok(())
    }

    fn clear(&self, user: &UserId) -> Result<(), String> {
        let mut pins = self
            .pins
            .lock()
            .map_err(|_| "pin store unavailable".to_string())?;
        pins.retain(|pin| &pin.user != user);
        Ok(())
    }
}

fn validate_bounds(bounds: &BoundingBox) -> Result<(), &'static str> {
    let lat = -90.0..=90.0;
    let long = -180.0..=180.0;
    if !lat.contains(&bounds.min_lat) || !lat.contains(&bounds.max_lat) {
        return Err("Latitude values must be between -90 and 90 degrees");
    }
    if !long.contains(&bounds.min_long) || !long.contains(&bounds.max_long) {
        return Err("Longitude values must be between -180 and 180 degrees");
    }
    if bounds.min_lat > bounds.max_lat {
        return Err("minLat must be less than or equal to maxLat");
    }
    if bounds.min_long > bounds.max_long {
        return Err("minLong must be less than or equal to maxLong");
    }
    Ok(())
}

fn overlay_response(overlay: &FeatureCollection) -> ServiceResponse {
    match serde_json::to_value(overlay) {
        Ok(value) => ServiceResponse::json(200, &value),
        Err(e) => ServiceResponse::json(200, &Envelope::error(e.to_string()).to_value()),
    }
}

impl MapService for MemoryMapService {
    async fn get_data(&self, bounds: &BoundingBox) -> Result<ServiceResponse, FetchError> {
        if let Err(message) = validate_bounds(bounds) {
            return Ok(ServiceResponse::json(200, &Envelope::error(message).to_value()));
        }
        Ok(overlay_response(&self.overlay.within(bounds)))
    }

    async fn get_area(&self, keyword: &str) -> Result<ServiceResponse, FetchError> {
        Ok(overlay_response(&self.overlay.matching(keyword)))
    }

    async fn get_pins(&self, user: Option<&UserId>) -> Result<ServiceResponse, FetchError> {
        Ok(ServiceResponse::json(200, &PinsBody::new(self.list(user)).to_value()))
    }

    async fn add_pin(
        &self,
        user: &UserId,
        lat: &str,
        lng: &str,
    ) -> Result<ServiceResponse, FetchError> {
        let body = match self.store(user, lat, lng) {
            Ok(()) => json!({
                "response_type": "success",
                "pin": format!("latitude: {lat}, longitude: {lng}"),
                "userId": user.as_str(),
            }),
            Err(error) => Envelope::failure(error).to_value(),
        };
        Ok(ServiceResponse::json(200, &body))
    }

    async fn clear_pins(&self, user: &UserId) -> Result<ServiceResponse, FetchError> {
        let body = if user.as_str().is_empty() {
            Envelope::failure("User ID is required").to_value()
        } else {
            match self.clear(user) {
                Ok(()) => Envelope::success(format!("All pins cleared for user: {user}")).to_value(),
                Err(error) => Envelope::failure(error).to_value(),
            }
        };
        Ok(ServiceResponse::json(200, &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn body(response: &ServiceResponse) -> Value {
        serde_json::from_str(&response.body).unwrap()
    }

    #[tokio::test]
    async fn test_add_then_list_shared_and_scoped() {
        let service = MemoryMapService::default();
        let alice = UserId::new("alice");
        let bob = UserId::new("bob");

        service.add_pin(&alice, "23", "23").await.unwrap();
        service.add_pin(&bob, "24", "24").await.unwrap();

        let all = body(&service.get_pins(None).await.unwrap());
        assert_eq!(all, json!({"pins": [["23", "23"], ["24", "24"]]}));

        let scoped = body(&service.get_pins(Some(&alice)).await.unwrap());
        assert_eq!(scoped, json!({"pins": [["23", "23"]]}));
    }

    #[tokio::test]
    async fn test_add_validates_range() {
        let service = MemoryMapService::default();
        let response = service
            .add_pin(&UserId::new("alice"), "91", "0")
            .await
            .unwrap();
        let value = body(&response);
        assert_eq!(value["response_type"], "failure");
        assert_eq!(value["error"], "Latitude must be between -90 and 90");
        assert_eq!(service.pin_count(), 0);
    }

    #[tokio::test]
    async fn test_clear_only_touches_one_user() {
        let service = MemoryMapService::default();
        let alice = UserId::new("alice");
        service.add_pin(&alice, "1", "1").await.unwrap();
        service.add_pin(&UserId::new("bob"), "2", "2").await.unwrap();

        let value = body(&service.clear_pins(&alice).await.unwrap());
        assert_eq!(value["response_type"], "success");
        assert_eq!(service.pin_count(), 1);
    }

    #[tokio::test]
    async fn test_get_data_rejects_inverted_bounds() {
        let service = MemoryMapService::default();
        let response = service
            .get_data(&BoundingBox::new(10.0, 0.0, -180.0, 180.0))
            .await
            .unwrap();
        let value = body(&response);
        assert_eq!(value["response_type"], "error");
        assert_eq!(value["error"], "minLat must be less than or equal to maxLat");
    }
}
