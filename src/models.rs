use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Formal,
    Casual,
    #[default]
    Friendly,
    Apologetic,
    Persuasive,
    Urgent,
}

impl Tone {
    pub const ALL: [Tone; 6] = [
        Tone::Formal,
        Tone::Casual,
        Tone::Friendly,
        Tone::Apologetic,
        Tone::Persuasive,
        Tone::Urgent,
    ];

    /// Wire name, as the backend expects it
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Formal => "formal",
            Tone::Casual => "casual",
            Tone::Friendly => "friendly",
            Tone::Apologetic => "apologetic",
            Tone::Persuasive => "persuasive",
            Tone::Urgent => "urgent",
        }
    }

    pub fn label(&self) -> String {
        inflections::case::to_title_case(self.as_str())
    }

    /// Matches a wire name case-insensitively
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|tone| tone.as_str().eq_ignore_ascii_case(raw))
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let i = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmailType {
    #[default]
    General,
    Meeting,
}

impl EmailType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailType::General => "general",
            EmailType::Meeting => "meeting",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            EmailType::General => EmailType::Meeting,
            EmailType::Meeting => EmailType::General,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DraftStatus {
    #[default]
    Draft,
    Sent,
    Failed,
}

impl DraftStatus {
    pub const ALL: [DraftStatus; 3] = [DraftStatus::Draft, DraftStatus::Sent, DraftStatus::Failed];

    pub fn as_str(&self) -> &'static str {
        match self {
            DraftStatus::Draft => "draft",
            DraftStatus::Sent => "sent",
            DraftStatus::Failed => "failed",
        }
    }

    /// Status only ever moves forward out of `Draft`; sent and failed are final.
    pub fn can_transition_to(self, next: DraftStatus) -> bool {
        matches!(
            (self, next),
            (DraftStatus::Draft, DraftStatus::Sent) | (DraftStatus::Draft, DraftStatus::Failed)
        )
    }
}

impl fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailDraft {
    pub id: i64,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub recipient: String,
    /// Kept as sent by the backend; see `known_tone`
    #[serde(default)]
    pub tone: String,
    #[serde(rename = "type", default)]
    pub email_type: EmailType,
    pub status: DraftStatus,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

impl EmailDraft {
    /// The tone as one of the known values, if it is one
    pub fn known_tone(&self) -> Option<Tone> {
        Tone::parse(&self.tone)
    }

    /// Title-cased tone for display, falling back to the raw value
    pub fn tone_label(&self) -> String {
        match self.known_tone() {
            Some(tone) => tone.label(),
            None => inflections::case::to_title_case(&self.tone),
        }
    }

    pub fn created_display(&self) -> String {
        format_timestamp(&self.created_at)
    }

    pub fn sent_display(&self) -> Option<String> {
        self.sent_at.as_deref().map(format_timestamp)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStat {
    pub month: String,
    #[serde(default)]
    pub sent: u64,
    #[serde(default)]
    pub drafts: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EmailStats {
    pub total_sent: u64,
    pub total_drafts: u64,
    pub success_rate: f64,
    pub recent_activity: u64,
    pub popular_tones: HashMap<String, u64>,
    pub monthly_stats: Vec<MonthlyStat>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub prompt: String,
    pub recipient: String,
    pub tone: Tone,
    pub email_type: EmailType,
}

impl GenerateRequest {
    /// Form fields for `POST /generate`
    pub fn form_fields(&self) -> [(&'static str, &str); 4] {
        [
            ("prompt", self.prompt.as_str()),
            ("recipient", self.recipient.as_str()),
            ("tone", self.tone.as_str()),
            ("type", self.email_type.as_str()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerateResponse {
    pub content: String,
    #[serde(default)]
    pub draft_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPreferences {
    pub email_sent: bool,
    pub draft_saved: bool,
    pub generation_complete: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email_sent: true,
            draft_saved: true,
            generation_complete: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    /// Lives in the keyring, never in the config file
    #[serde(skip)]
    pub smtp_password: String,
    pub default_tone: Tone,
    pub auto_save_drafts: bool,
    pub email_signature: String,
    pub notification_preferences: NotificationPreferences,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            default_tone: Tone::Friendly,
            auto_save_drafts: true,
            email_signature: "Best regards,\nYour Name\nYour Company".to_string(),
            notification_preferences: NotificationPreferences::default(),
        }
    }
}

/// Renders a backend timestamp in local time. Accepts RFC 3339 and the
/// naive ISO-8601 form the backend emits; anything else is shown verbatim.
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt
            .with_timezone(&Local)
            .format("%b %d %Y @ %-I:%M%p")
            .to_string();
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.format("%b %d %Y @ %-I:%M%p").to_string();
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_deserializes_backend_shape() {
        let json = r#"{
            "id": 7,
            "prompt": "Ask for a deadline extension",
            "content": "Dear boss,",
            "recipient": "boss@co.com",
            "tone": "apologetic",
            "type": "meeting",
            "status": "sent",
            "created_at": "2024-03-01T10:15:00.123456",
            "sent_at": "2024-03-01T10:20:00"
        }"#;
        let draft: EmailDraft = serde_json::from_str(json).unwrap();
        assert_eq!(draft.id, 7);
        assert_eq!(draft.known_tone(), Some(Tone::Apologetic));
        assert_eq!(draft.email_type, EmailType::Meeting);
        assert_eq!(draft.status, DraftStatus::Sent);
        assert!(draft.subject.is_none());
        assert_eq!(draft.created_display(), "Mar 01 2024 @ 10:15AM");
    }

    #[test]
    fn test_unknown_tone_is_kept_verbatim() {
        let json = r#"{"id": 3, "tone": "professional", "status": "draft"}"#;
        let draft: EmailDraft = serde_json::from_str(json).unwrap();
        assert_eq!(draft.tone, "professional");
        assert_eq!(draft.known_tone(), None);
        assert_eq!(draft.tone_label(), "Professional");
        assert_eq!(Tone::parse(" Urgent "), Some(Tone::Urgent));
    }

    #[test]
    fn test_stats_tolerates_missing_fields() {
        let stats: EmailStats = serde_json::from_str(r#"{"total_sent": 3}"#).unwrap();
        assert_eq!(stats.total_sent, 3);
        assert_eq!(stats.total_drafts, 0);
        assert!(stats.popular_tones.is_empty());
        assert!(stats.monthly_stats.is_empty());
    }

    #[test]
    fn test_status_is_monotonic() {
        assert!(DraftStatus::Draft.can_transition_to(DraftStatus::Sent));
        assert!(DraftStatus::Draft.can_transition_to(DraftStatus::Failed));
        assert!(!DraftStatus::Sent.can_transition_to(DraftStatus::Draft));
        assert!(!DraftStatus::Failed.can_transition_to(DraftStatus::Sent));
        assert!(!DraftStatus::Draft.can_transition_to(DraftStatus::Draft));
    }

    #[test]
    fn test_tone_cycles_through_all_values() {
        let mut tone = Tone::Formal;
        for _ in 0..Tone::ALL.len() {
            tone = tone.next();
        }
        assert_eq!(tone, Tone::Formal);
        assert_eq!(Tone::Formal.prev(), Tone::Urgent);
        assert_eq!(Tone::Persuasive.label(), "Persuasive");
    }

    #[test]
    fn test_generate_form_fields() {
        let req = GenerateRequest {
            prompt: "Hi".into(),
            recipient: "a@b.c".into(),
            tone: Tone::Urgent,
            email_type: EmailType::General,
        };
        assert_eq!(
            req.form_fields(),
            [
                ("prompt", "Hi"),
                ("recipient", "a@b.c"),
                ("tone", "urgent"),
                ("type", "general")
            ]
        );
    }

    #[test]
    fn test_unparseable_timestamp_is_shown_verbatim() {
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }
}
