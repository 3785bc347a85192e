//! Wire format of the remote map service.
//!
//! Every endpoint answers with JSON. Failures come in two shapes: a non-2xx
//! status, or a 200 whose body carries `response_type: "error"` (some
//! handlers spell it `"failure"`). Both are decoded here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FetchError;

pub const RESPONSE_SUCCESS: &str = "success";
pub const RESPONSE_ERROR: &str = "error";
pub const RESPONSE_FAILURE: &str = "failure";

/// Raw answer from the service: status plus undecoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: String,
}

impl ServiceResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON.
    pub fn value(&self) -> Result<Value, FetchError> {
        serde_json::from_str(&self.body)
            .map_err(|e| FetchError::malformed(format!("body is not JSON: {e}")))
    }

    /// Best-effort human readable message from an error body: `message`,
    /// then `error`, then the raw text.
    pub fn error_message(&self) -> String {
        match serde_json::from_str::<Envelope>(&self.body) {
            Ok(envelope) => envelope
                .message
                .or(envelope.error)
                .unwrap_or_else(|| self.body.clone()),
            Err(_) => self.body.clone(),
        }
    }
}

/// Status fields shared by every response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Envelope {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            response_type: Some(RESPONSE_SUCCESS.to_string()),
            error: None,
            message: Some(message.into()),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            response_type: Some(RESPONSE_FAILURE.to_string()),
            error: Some(error.into()),
            message: None,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            response_type: Some(RESPONSE_ERROR.to_string()),
            error: Some(error.into()),
            message: None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self.response_type.as_deref(),
            Some(RESPONSE_ERROR) | Some(RESPONSE_FAILURE)
        )
    }

    /// Read the envelope fields out of any JSON body. Non-object bodies have
    /// no envelope.
    pub fn of(value: &Value) -> Self {
        Envelope::deserialize(value).unwrap_or_default()
    }

    /// `Err(ServerError)` if the body reports a failure.
    pub fn check(value: &Value) -> Result<(), FetchError> {
        let envelope = Self::of(value);
        if envelope.is_error() {
            Err(FetchError::ServerError {
                message: envelope
                    .error
                    .or(envelope.message)
                    .unwrap_or_else(|| "unknown error".to_string()),
            })
        } else {
            Ok(())
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Body of `getPins`: each pin is `[lat, lng]` as strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PinsBody {
    pub pins: Vec<Vec<String>>,
}

impl PinsBody {
    pub fn new<I, L, G>(pins: I) -> Self
    where
        I: IntoIterator<Item = (L, G)>,
        L: Into<String>,
        G: Into<String>,
    {
        Self {
            pins: pins
                .into_iter()
                .map(|(lat, lng)| vec![lat.into(), lng.into()])
                .collect(),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
