use crate::api::{ApiError, Backend};
use crate::models::{EmailDraft, EmailStats};
use tracing::{info, warn};

/// Read-through copy of what the backend last returned. Never patched in
/// place, except for dropping a draft the backend confirmed as deleted.
#[derive(Debug, Default)]
pub struct DraftStore {
    pub emails: Vec<EmailDraft>,
    pub stats: EmailStats,
    pub last_error: Option<String>,
}

impl DraftStore {
    pub async fn refresh_emails(&mut self, backend: &dyn Backend) {
        match backend.list_emails().await {
            Ok(emails) => {
                info!(count = emails.len(), "loaded drafts");
                self.emails = emails;
                self.last_error = None;
            }
            Err(e) => {
                warn!("Error fetching emails: {}", e);
                self.last_error = Some("Failed to fetch emails".to_string());
            }
        }
    }

    pub async fn refresh_stats(&mut self, backend: &dyn Backend) {
        match backend.stats().await {
            Ok(stats) => self.stats = stats,
            Err(e) => {
                warn!("Error fetching stats: {}", e);
                self.last_error = Some("Failed to fetch stats".to_string());
            }
        }
    }

    /// Full reload, the synchronization step after every mutation
    pub async fn refresh(&mut self, backend: &dyn Backend) {
        self.refresh_emails(backend).await;
        self.refresh_stats(backend).await;
    }

    /// Removes the draft locally only once the backend confirms the delete.
    pub async fn delete(&mut self, backend: &dyn Backend, id: i64) -> Result<(), ApiError> {
        if let Err(e) = backend.delete_email(id).await {
            warn!("Error deleting email {}: {}", id, e);
            return Err(e);
        }
        self.emails.retain(|email| email.id != id);
        self.refresh_stats(backend).await;
        Ok(())
    }

    pub fn get(&self, id: i64) -> Option<&EmailDraft> {
        self.emails.iter().find(|email| email.id == id)
    }
}

#[cfg(test)]
pub(crate) fn draft(id: i64, status: crate::models::DraftStatus, tone: crate::models::Tone) -> EmailDraft {
    EmailDraft {
        id,
        prompt: format!("prompt {}", id),
        content: format!("content {}", id),
        recipient: format!("person{}@example.com", id),
        tone: tone.as_str().to_string(),
        email_type: crate::models::EmailType::General,
        status,
        created_at: "2024-01-01T00:00:00".to_string(),
        sent_at: None,
        subject: None,
    }
}
