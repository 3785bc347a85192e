//! Pin store client: list, add and clear a user's pins on the remote service.

use std::sync::Arc;

use redline_common::wire::{Envelope, PinsBody};
use redline_common::{FetchError, GeoCoordinate, MapService, PinVisibility, ServiceResponse, UserId};

pub struct PinStore<S> {
    service: Arc<S>,
    visibility: PinVisibility,
}

impl<S> Clone for PinStore<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            visibility: self.visibility,
        }
    }
}

impl<S: MapService> PinStore<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self::with_visibility(service, PinVisibility::default())
    }

    pub fn with_visibility(service: Arc<S>, visibility: PinVisibility) -> Self {
        Self {
            service,
            visibility,
        }
    }

    pub fn visibility(&self) -> PinVisibility {
        self.visibility
    }

    /// Current pins, in the order the service returned them.
    ///
    /// With [`PinVisibility::Shared`] this is every user's pins; `user` is
    /// only sent when listing is per-user.
    pub async fn list_pins(&self, user: &UserId) -> Result<Vec<GeoCoordinate>, FetchError> {
        let scope = match self.visibility {
            PinVisibility::Shared => None,
            PinVisibility::PerUser => Some(user),
        };
        tracing::debug!(?scope, "listing pins");
        let response = self.service.get_pins(scope).await?;
        let value = checked(&response)?;
        let body: PinsBody = serde_json::from_value(value)
            .map_err(|e| FetchError::malformed(format!("pins body: {e}")))?;
        Ok(body.pins.iter().map(|pair| parse_pin(pair)).collect())
    }

    /// Persist one pin. `lat`/`lng` go on the wire exactly as given.
    pub async fn add_pin(&self, user: &UserId, lat: &str, lng: &str) -> Result<(), FetchError> {
        tracing::debug!(%user, lat, lng, "adding pin");
        let response = self.service.add_pin(user, lat, lng).await?;
        checked(&response).map(drop)
    }

    /// Remove every pin `user` owns. Clearing an empty set succeeds.
    pub async fn clear_pins(&self, user: &UserId) -> Result<(), FetchError> {
        tracing::debug!(%user, "clearing pins");
        let response = self.service.clear_pins(user).await?;
        checked(&response).map(drop)
    }
}

/// Status and envelope checks shared by every pin endpoint.
fn checked(response: &ServiceResponse) -> Result<serde_json::Value, FetchError> {
    if !response.is_success() {
        tracing::warn!(status = response.status, "pin request rejected");
        return Err(FetchError::failed(format!(
            "status {}: {}",
            response.status,
            response.error_message()
        )));
    }
    let value = response.value()?;
    Envelope::check(&value)?;
    Ok(value)
}

/// `[lat, lng]` strings to a coordinate.
///
/// Each component is read up to the end of its leading number, so `"23abc"`
/// is 23. No leading number, or a missing component, gives NaN; the pin is
/// kept either way.
pub fn parse_pin(pair: &[String]) -> GeoCoordinate {
    let component = |i: usize| pair.get(i).map_or(f64::NAN, |s| leading_number(s));
    GeoCoordinate::new(component(0), component(1))
}

fn leading_number(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let digits = |from: usize| {
        bytes
            .get(from..)
            .map_or(0, |rest| rest.iter().take_while(|b| b.is_ascii_digit()).count())
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    if s[end..].starts_with("Infinity") {
        return s[..end + "Infinity".len()].parse().unwrap_or(f64::NAN);
    }

    let int = digits(end);
    end += int;
    if bytes.get(end) == Some(&b'.') {
        let frac = digits(end + 1);
        if int + frac == 0 {
            return f64::NAN;
        }
        end += 1 + frac;
    } else if int == 0 {
        return f64::NAN;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exp = digits(end + 1 + sign);
        if exp > 0 {
            end += 1 + sign + exp;
        }
    }
    s[..end].parse().unwrap_or(f64::NAN)
}
