//! Raw operator input as it arrives from a form or device callback.
//!
//! Every field is a string (or absent) because that is what the transport
//! carries. Conversion into typed registry requests happens here so the
//! registry only ever sees extracted values.

use fpd_core::{DomainError, DomainResult, EnrollUser, UserId};
use serde::{Deserialize, Serialize};

/// Enrollment form exactly as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEnrollForm {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub card_id: String,
}

impl RawEnrollForm {
    /// Validates the form and produces an enrollment request.
    ///
    /// Blank fields yield "Please fill all fields". A numeric id outside the
    /// sensor range yields the range message; uniqueness is left to the
    /// registry.
    pub fn to_request(&self) -> DomainResult<EnrollUser> {
        let user_id = self.user_id.trim();
        let name = self.name.trim();
        let phone = self.phone.trim();
        let card_id = self.card_id.trim();

        if [user_id, name, phone, card_id].iter().any(|f| f.is_empty()) {
            return Err(DomainError::validation("Please fill all fields"));
        }

        let id: i64 = user_id
            .parse()
            .map_err(|_| DomainError::validation(format!("User ID '{user_id}' is not a number")))?;

        let id = u32::try_from(id)
            .ok()
            .filter(|id| UserId::new(*id).is_valid_slot())
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "User ID must be between {} and {}",
                    UserId::MIN,
                    UserId::MAX
                ))
            })?;

        Ok(EnrollUser {
            id,
            name: name.to_string(),
            phone: phone.to_string(),
            card_id: card_id.to_string(),
        })
    }
}

/// An access attempt reported by a device.
///
/// Missing name or card is normal for unrecognised fingers; the registry
/// records those with its "Unknown"/"N/A" placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAccessEvent {
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub card_id: Option<String>,
    pub granted: bool,
}

impl RawAccessEvent {
    pub fn user_name(&self) -> &str {
        self.user_name.as_deref().unwrap_or_default()
    }

    pub fn card_id(&self) -> &str {
        self.card_id.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(id: &str, name: &str) -> RawEnrollForm {
        RawEnrollForm {
            user_id: id.to_string(),
            name: name.to_string(),
            phone: "+250780146487".to_string(),
            card_id: "CARD004".to_string(),
        }
    }

    #[test]
    fn test_valid_form() {
        let request = form(" 4 ", "  Alice Johnson ").to_request().unwrap();
        assert_eq!(request.id, 4);
        assert_eq!(request.name, "Alice Johnson");
        assert_eq!(request.card_id, "CARD004");
    }

    #[test]
    fn test_blank_field() {
        let err = form("4", "   ").to_request().unwrap_err();
        assert_eq!(err, DomainError::validation("Please fill all fields"));

        let err = form("", "Alice").to_request().unwrap_err();
        assert_eq!(err, DomainError::validation("Please fill all fields"));
    }

    #[test]
    fn test_out_of_range_ids() {
        for id in ["0", "21", "-3", "99999999999"] {
            let err = form(id, "Alice").to_request().unwrap_err();
            assert_eq!(
                err,
                DomainError::validation("User ID must be between 1 and 20"),
                "id {id}"
            );
        }
    }

    #[test]
    fn test_non_numeric_id() {
        let err = form("abc", "Alice").to_request().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn test_access_event_from_json() {
        let event: RawAccessEvent = serde_json::from_str(r#"{"granted": false}"#).unwrap();
        assert_eq!(event.user_name(), "");
        assert_eq!(event.card_id(), "");
        assert!(!event.granted);

        let event: RawAccessEvent =
            serde_json::from_str(r#"{"user_name": "Jane Smith", "card_id": "CARD002", "granted": true}"#)
                .unwrap();
        assert_eq!(event.user_name(), "Jane Smith");
    }
}
