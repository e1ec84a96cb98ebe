//! Emergency contacts and alerts.
//!
//! Sending an alert records who was notified and, when location sharing is
//! on, where the user was. Calling a contact yields the `tel:` URI the phone
//! dials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Number of sent alerts kept.
pub const ALERT_LOG_LIMIT: usize = 50;

/// Errors from the emergency screen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmergencyError {
    /// No contact has this id.
    #[error("Emergency contact not found: {0}")]
    ContactNotFound(u32),

    /// Emergency alerts are switched off in settings.
    #[error("Emergency alerts are turned off in settings")]
    AlertsDisabled,
}

/// Result type for emergency operations.
pub type EmergencyResult<T> = std::result::Result<T, EmergencyError>;

/// Who a contact is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContactKind {
    /// A public emergency service.
    Emergency,
    /// Family or a friend.
    Personal,
}

/// Someone to notify in an emergency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EmergencyContact {
    /// Stable id.
    #[schema(example = 1)]
    pub id: u32,
    /// Display name.
    #[schema(example = "Emergency Services")]
    pub name: String,
    /// Phone number.
    #[schema(example = "911")]
    pub number: String,
    /// Contact type.
    pub kind: ContactKind,
}

impl EmergencyContact {
    /// URI that dials this contact.
    #[must_use]
    pub fn dial_uri(&self) -> String {
        format!("tel:{}", self.number)
    }
}

/// A sent emergency alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EmergencyAlert {
    /// Alert id.
    pub id: Uuid,
    /// Location included with the alert, if sharing is on.
    #[schema(example = "123 Main Street, Downtown")]
    pub location: Option<String>,
    /// Contacts the alert went to.
    pub recipients: Vec<EmergencyContact>,
    /// When it was sent.
    pub sent_at: DateTime<Utc>,
}

/// Contacts plus the log of sent alerts.
#[derive(Debug, Clone)]
pub struct EmergencyCenter {
    contacts: Vec<EmergencyContact>,
    alerts: Vec<EmergencyAlert>,
}

impl Default for EmergencyCenter {
    fn default() -> Self {
        Self::new()
    }
}

fn contact(id: u32, name: &str, number: &str, kind: ContactKind) -> EmergencyContact {
    EmergencyContact {
        id,
        name: name.to_string(),
        number: number.to_string(),
        kind,
    }
}

impl EmergencyCenter {
    /// Emergency services plus two personal contacts.
    #[must_use]
    pub fn new() -> Self {
        Self {
            contacts: vec![
                contact(1, "Emergency Services", "911", ContactKind::Emergency),
                contact(2, "John Doe", "+1234567890", ContactKind::Personal),
                contact(3, "Jane Smith", "+1987654321", ContactKind::Personal),
            ],
            alerts: Vec::new(),
        }
    }

    /// All contacts.
    #[must_use]
    pub fn contacts(&self) -> &[EmergencyContact] {
        &self.contacts
    }

    /// Sent alerts, newest first.
    #[must_use]
    pub fn alerts(&self) -> &[EmergencyAlert] {
        &self.alerts
    }

    /// Notifies every contact.
    ///
    /// `location` is attached as given; pass `None` when sharing is off.
    ///
    /// # Errors
    ///
    /// Returns [`EmergencyError::AlertsDisabled`] if `alerts_enabled` is false.
    pub fn send_alert(
        &mut self,
        location: Option<String>,
        alerts_enabled: bool,
    ) -> EmergencyResult<EmergencyAlert> {
        if !alerts_enabled {
            warn!("Emergency alert blocked by settings");
            return Err(EmergencyError::AlertsDisabled);
        }

        let alert = EmergencyAlert {
            id: Uuid::new_v4(),
            location,
            recipients: self.contacts.clone(),
            sent_at: Utc::now(),
        };
        warn!(
            alert = %alert.id,
            recipients = alert.recipients.len(),
            shared_location = alert.location.is_some(),
            "Emergency alert sent"
        );

        self.alerts.insert(0, alert.clone());
        self.alerts.truncate(ALERT_LOG_LIMIT);
        Ok(alert)
    }

    /// The contact to dial.
    ///
    /// # Errors
    ///
    /// Returns [`EmergencyError::ContactNotFound`] for an unknown id.
    pub fn call(&self, id: u32) -> EmergencyResult<&EmergencyContact> {
        let contact = self
            .contacts
            .iter()
            .find(|c| c.id == id)
            .ok_or(EmergencyError::ContactNotFound(id))?;
        info!(contact = contact.id, name = %contact.name, "Calling emergency contact");
        Ok(contact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_contacts() {
        let center = EmergencyCenter::new();
        let contacts = center.contacts();
        assert_eq!(contacts.len(), 3);
        assert_eq!(contacts[0].number, "911");
        assert_eq!(contacts[0].kind, ContactKind::Emergency);
        assert_eq!(contacts[1].dial_uri(), "tel:+1234567890");
    }

    #[test]
    fn test_alert_goes_to_every_contact() {
        let mut center = EmergencyCenter::new();
        let alert = center
            .send_alert(Some("123 Main Street, Downtown".into()), true)
            .unwrap();
        assert_eq!(alert.recipients.len(), 3);
        assert_eq!(alert.location.as_deref(), Some("123 Main Street, Downtown"));

        let second = center.send_alert(None, true).unwrap();
        assert!(second.location.is_none());
        assert_eq!(center.alerts()[0].id, second.id);
    }

    #[test]
    fn test_alert_blocked_when_disabled() {
        let mut center = EmergencyCenter::new();
        assert_eq!(
            center.send_alert(None, false),
            Err(EmergencyError::AlertsDisabled)
        );
        assert!(center.alerts().is_empty());
    }

    #[test]
    fn test_alert_log_is_capped() {
        let mut center = EmergencyCenter::new();
        for _ in 0..ALERT_LOG_LIMIT + 5 {
            center.send_alert(None, true).unwrap();
        }
        assert_eq!(center.alerts().len(), ALERT_LOG_LIMIT);
    }

    #[test]
    fn test_call_contact() {
        let center = EmergencyCenter::new();
        assert_eq!(center.call(3).unwrap().name, "Jane Smith");
        assert_eq!(center.call(9), Err(EmergencyError::ContactNotFound(9)));
    }
}
