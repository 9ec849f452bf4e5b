//! Wire types for the backend endpoints.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use shora_core::{ConversationState, InteractionMode, UserProfile};
use tracing::warn;

use crate::error::{GatewayError, Result};

/// Incident defaults for reports filed from the chat.
pub const INCIDENT_TYPE: &str = "danger";
pub const INCIDENT_SEVERITY: &str = "high";
pub const INCIDENT_REPORTER: &str = "chatbot";
pub const INCIDENT_LOCATION: &str = "Chantier";

/// Body of `POST /chatbot-users/create-or-update`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileUpsert {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profession: Option<String>,
    #[serde(rename = "chantierType", skip_serializing_if = "Option::is_none")]
    pub site_type: Option<String>,
    #[serde(rename = "langue", skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<InteractionMode>,
}

impl ProfileUpsert {
    /// Only the name, as sent right after the user introduces themselves.
    pub fn name_only(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            profession: None,
            site_type: None,
            language: None,
            mode: None,
        }
    }

    /// Full profile; None when the profile has no name yet.
    pub fn from_profile(profile: &UserProfile) -> Option<Self> {
        let name = profile.display_name()?.to_string();
        Some(Self {
            name,
            profession: profile.profession.clone(),
            site_type: profile.site_type.clone(),
            language: profile.language.clone(),
            mode: profile.mode,
        })
    }
}

/// What the backend knows about the user after an upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub user_id: Option<String>,
    pub newly_created: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegistrationEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<RecordId>,
    #[serde(rename = "isNewUser", default)]
    pub is_new_user: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecordId {
    #[serde(rename = "_id")]
    pub id: Option<String>,
}

impl RegistrationEnvelope {
    pub(crate) fn into_registration(self) -> Result<Registration> {
        if !self.success {
            return Err(GatewayError::Rejected(
                self.error
                    .unwrap_or_else(|| "profile upsert not accepted".to_string()),
            ));
        }
        Ok(Registration {
            user_id: self.data.and_then(|d| d.id),
            newly_created: self.is_new_user,
        })
    }
}

/// Body of `POST /bot/voice-bot`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BotReplyRequest {
    pub text: String,
    pub profile: UserProfile,
    pub state: ConversationState,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BotReplyResponse {
    #[serde(default)]
    pub text_bot: Option<String>,
}

impl BotReplyResponse {
    /// Blank replies count as no reply.
    pub(crate) fn into_text(self) -> Option<String> {
        self.text_bot.filter(|t| !t.trim().is_empty())
    }
}

/// Body of `POST /api/incidents`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentReport {
    pub description: String,
    #[serde(rename = "type")]
    pub incident_type: String,
    pub severity: String,
    #[serde(rename = "reportedBy")]
    pub reported_by: String,
    pub location: String,
    #[serde(rename = "chatbotUserId")]
    pub chatbot_user_id: Option<String>,
    #[serde(rename = "chatbotUserName")]
    pub chatbot_user_name: Option<String>,
}

impl IncidentReport {
    /// Report filed from a chat message, attributed to the profile when known.
    pub fn from_chat(description: impl Into<String>, profile: &UserProfile) -> Self {
        Self {
            description: description.into(),
            incident_type: INCIDENT_TYPE.to_string(),
            severity: INCIDENT_SEVERITY.to_string(),
            reported_by: INCIDENT_REPORTER.to_string(),
            location: INCIDENT_LOCATION.to_string(),
            chatbot_user_id: profile.remote_user_id.clone(),
            chatbot_user_name: profile.display_name().map(str::to_string),
        }
    }
}

/// A server-side reminder addressed to one user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Reminder {
    #[serde(rename = "_id")]
    pub id: String,
    pub message: String,
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
    #[serde(rename = "createdAt", default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Open incident as listed by the admin endpoint (the console's notification feed).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IncidentSummary {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub incident_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "reportedAt", default, deserialize_with = "lenient_timestamp")]
    pub reported_at: Option<DateTime<Utc>>,
}

impl IncidentSummary {
    pub fn title(&self) -> String {
        format!(
            "Nouvel incident: {}",
            self.incident_type.as_deref().unwrap_or("Incident")
        )
    }
}

/// Fails with Rejected when the body is an envelope carrying `success: false`.
pub(crate) fn check_success(body: &Value) -> Result<()> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let reason = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("request not accepted");
        return Err(GatewayError::Rejected(reason.to_string()));
    }
    Ok(())
}

/// RFC 3339 timestamps only; anything else (or a non-string) reads as unknown.
fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
        .map(|at| at.with_timezone(&Utc)))
}

/// Accepts a bare array, `{success, data: [...]}` or `{data: {data: [...]}}`.
/// Items that do not decode are logged and skipped.
pub(crate) fn extract_list<T: DeserializeOwned>(body: Value) -> Result<Vec<T>> {
    match body {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    warn!(error = %e, "skipping undecodable list item");
                    None
                }
            })
            .collect()),
        Value::Object(mut map) => {
            check_success(&Value::Object(map.clone()))?;
            match map.remove("data") {
                Some(data) => extract_list(data),
                None => Ok(Vec::new()),
            }
        }
        Value::Null => Ok(Vec::new()),
        other => Err(GatewayError::Malformed(format!(
            "expected a list, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_upsert_skips_missing_fields() {
        let body = serde_json::to_value(ProfileUpsert::name_only("Awa")).unwrap();
        assert_eq!(body, json!({"name": "Awa"}));
    }

    #[test]
    fn test_profile_upsert_requires_name() {
        assert!(ProfileUpsert::from_profile(&UserProfile::default()).is_none());
        let profile = UserProfile {
            name: Some("Awa".to_string()),
            profession: Some("maçon".to_string()),
            site_type: Some("bâtiment".to_string()),
            language: Some("fr".to_string()),
            mode: Some(InteractionMode::Audio),
            ..Default::default()
        };
        let body = serde_json::to_value(ProfileUpsert::from_profile(&profile).unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "name": "Awa",
                "profession": "maçon",
                "chantierType": "bâtiment",
                "langue": "fr",
                "mode": "audio"
            })
        );
    }

    #[test]
    fn test_registration_envelope() {
        let envelope: RegistrationEnvelope = serde_json::from_value(json!({
            "success": true,
            "data": {"_id": "u1"},
            "isNewUser": true
        }))
        .unwrap();
        let reg = envelope.into_registration().unwrap();
        assert_eq!(reg.user_id.as_deref(), Some("u1"));
        assert!(reg.newly_created);

        let rejected: RegistrationEnvelope =
            serde_json::from_value(json!({"success": false, "error": "nope"})).unwrap();
        assert_eq!(
            rejected.into_registration(),
            Err(GatewayError::Rejected("nope".to_string()))
        );
    }

    #[test]
    fn test_incident_report_defaults() {
        let profile = UserProfile {
            name: Some("Awa".to_string()),
            remote_user_id: Some("u1".to_string()),
            ..Default::default()
        };
        let body = serde_json::to_value(IncidentReport::from_chat("fil dénudé", &profile)).unwrap();
        assert_eq!(body["type"], "danger");
        assert_eq!(body["severity"], "high");
        assert_eq!(body["reportedBy"], "chatbot");
        assert_eq!(body["location"], "Chantier");
        assert_eq!(body["chatbotUserId"], "u1");
        assert_eq!(body["chatbotUserName"], "Awa");

        let anonymous = serde_json::to_value(IncidentReport::from_chat("x", &UserProfile::default())).unwrap();
        assert!(anonymous["chatbotUserId"].is_null());
        assert!(anonymous["chatbotUserName"].is_null());
    }

    #[test]
    fn test_blank_bot_reply_is_none() {
        let blank = BotReplyResponse { text_bot: Some("  ".to_string()) };
        assert!(blank.into_text().is_none());
        let absent = BotReplyResponse { text_bot: None };
        assert!(absent.into_text().is_none());
    }

    #[test]
    fn test_extract_list_shapes() {
        let item = json!({"_id": "r1", "message": "casque"});
        let bare: Vec<Reminder> = extract_list(json!([item.clone()])).unwrap();
        assert_eq!(bare.len(), 1);

        let wrapped: Vec<Reminder> = extract_list(json!({"success": true, "data": [item.clone()]})).unwrap();
        assert_eq!(wrapped[0].id, "r1");

        let nested: Vec<Reminder> = extract_list(json!({"success": true, "data": {"data": [item]}})).unwrap();
        assert_eq!(nested.len(), 1);

        let rejected: Result<Vec<Reminder>> = extract_list(json!({"success": false, "error": "boom"}));
        assert!(matches!(rejected, Err(GatewayError::Rejected(_))));

        let malformed: Result<Vec<Reminder>> = extract_list(json!("text"));
        assert!(matches!(malformed, Err(GatewayError::Malformed(_))));
    }

    #[test]
    fn test_bad_reminder_does_not_hide_the_others() {
        let body = json!({
            "success": true,
            "data": [
                {"_id": "r1", "message": "casque", "createdAt": "2026-10-18T08:00:00Z"},
                {"_id": "r2", "message": "gants", "createdAt": "Sun Oct 18 2026 10:00:00 GMT+0200"},
                {"_id": "r3", "imageUrl": "https://example.org/harnais.png"}
            ]
        });
        let reminders: Vec<Reminder> = extract_list(body).unwrap();
        let ids: Vec<&str> = reminders.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2"]);
        assert!(reminders[0].created_at.is_some());
        assert_eq!(reminders[1].created_at, None);
    }
}
