//! Inbound event payloads and their validated forms.
//!
//! Payloads arrive as loosely-typed JSON: every field is optional on the
//! wire and an empty string counts as absent. Validation turns them into
//! [`InitRequest`] / [`AuthUpdate`], which the registry acts on.

use serde::Deserialize;

use super::EndpointId;
use crate::error::PresenceError;

/// Body of an `init` event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InitPayload {
    /// Client label; an inspector label makes this an inspector window.
    #[serde(default)]
    pub client_type: Option<String>,
    /// Session id to inspect (inspectors only).
    #[serde(default)]
    pub client_id: Option<String>,
}

/// Body of an `update_auth` event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAuthPayload {
    /// Session whose auth state changed.
    #[serde(default)]
    pub client_id: Option<String>,
    /// New auth payload, opaque to the relay. An absent key reads as
    /// `null`, which is relayed like any other value.
    #[serde(default)]
    pub user: serde_json::Value,
}

/// A validated `init` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitRequest {
    /// An ordinary client opening its own session.
    Client {
        /// Client label to store on the session.
        kind: String,
    },
    /// An inspector window attaching to an existing session.
    Inspector {
        /// Session being inspected.
        target: EndpointId,
    },
}

/// A validated `update_auth` event.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUpdate {
    /// Session whose data is replaced and who receives `auth_change`.
    pub target: EndpointId,
    /// New auth payload.
    pub user: serde_json::Value,
}

impl InitPayload {
    /// Validates the payload. `inspector_types` lists the `client_type`
    /// values that denote an inspector window.
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError::Validation`] if `client_type` is missing,
    /// or if an inspector omits `client_id`.
    pub fn validate(self, inspector_types: &[String]) -> Result<InitRequest, PresenceError> {
        let kind = present(self.client_type).ok_or_else(|| {
            PresenceError::Validation("init event error, missing [client_type] param".to_string())
        })?;

        if !inspector_types.iter().any(|t| *t == kind) {
            return Ok(InitRequest::Client { kind });
        }

        let target = present(self.client_id).ok_or_else(|| {
            PresenceError::Validation("init event error, missing [client_id] param".to_string())
        })?;
        Ok(InitRequest::Inspector {
            target: EndpointId::from(target),
        })
    }
}

impl UpdateAuthPayload {
    /// Validates the payload.
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError::Validation`] if `client_id` is missing.
    pub fn validate(self) -> Result<AuthUpdate, PresenceError> {
        let target = present(self.client_id).ok_or_else(|| {
            PresenceError::Validation(
                "update_auth event error, missing [client_id] param".to_string(),
            )
        })?;
        Ok(AuthUpdate {
            target: EndpointId::from(target),
            user: self.user,
        })
    }
}

fn present(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.is_empty())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn inspectors() -> Vec<String> {
        vec!["ida".to_string(), "inspector".to_string()]
    }

    fn init(json: serde_json::Value) -> InitPayload {
        let Ok(payload) = serde_json::from_value(json) else {
            panic!("payload should deserialize");
        };
        payload
    }

    #[test]
    fn client_init() {
        let result = init(serde_json::json!({"client_type": "browser"})).validate(&inspectors());
        let Ok(InitRequest::Client { kind }) = result else {
            panic!("expected client request");
        };
        assert_eq!(kind, "browser");
    }

    #[test]
    fn inspector_init_needs_client_id() {
        let result = init(serde_json::json!({"client_type": "ida"})).validate(&inspectors());
        assert!(matches!(result, Err(PresenceError::Validation(_))));

        let result = init(serde_json::json!({"client_type": "ida", "client_id": "a"}))
            .validate(&inspectors());
        assert_eq!(
            result.ok(),
            Some(InitRequest::Inspector {
                target: EndpointId::from("a")
            })
        );
    }

    #[test]
    fn empty_client_type_is_missing() {
        let result = init(serde_json::json!({"client_type": ""})).validate(&inspectors());
        assert!(matches!(result, Err(PresenceError::Validation(_))));
        let result = init(serde_json::json!({})).validate(&inspectors());
        assert!(matches!(result, Err(PresenceError::Validation(_))));
    }

    #[test]
    fn client_id_is_ignored_for_clients() {
        let result = init(serde_json::json!({"client_type": "browser", "client_id": "x"}))
            .validate(&inspectors());
        assert!(matches!(result, Ok(InitRequest::Client { .. })));
    }

    #[test]
    fn update_auth_requires_client_id() {
        let missing_id = UpdateAuthPayload {
            client_id: None,
            user: serde_json::json!({}),
        };
        assert!(matches!(missing_id.validate(), Err(PresenceError::Validation(_))));

        let Ok(update) = serde_json::from_value::<UpdateAuthPayload>(
            serde_json::json!({"client_id": "a", "user": {"name": "x"}}),
        ) else {
            panic!("payload should deserialize");
        };
        let Ok(update) = update.validate() else {
            panic!("payload should validate");
        };
        assert_eq!(update.target, EndpointId::from("a"));
        assert_eq!(update.user, serde_json::json!({"name": "x"}));
    }

    #[test]
    fn null_or_absent_user_is_kept_as_null() {
        for json in [
            serde_json::json!({"client_id": "a", "user": null}),
            serde_json::json!({"client_id": "a"}),
        ] {
            let Ok(payload) = serde_json::from_value::<UpdateAuthPayload>(json) else {
                panic!("payload should deserialize");
            };
            let Ok(update) = payload.validate() else {
                panic!("null user should validate");
            };
            assert_eq!(update.target, EndpointId::from("a"));
            assert!(update.user.is_null());
        }
    }
}
