use crate::api::{ApiError, Backend};
use crate::models::{DraftStatus, EmailDraft, GenerateRequest};
use chrono::Utc;
use tracing::{info, warn};

pub const GENERATE_FAILED: &str = "Failed to generate email.";
pub const SEND_OK: &str = "Email sent successfully!";
pub const SEND_FAILED: &str = "Failed to send email.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Generating,
    DraftReady,
    Sending,
    Sent,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing to send; no request was made
    NoDraft,
    Sent(i64),
    Failed(i64),
}

/// Holds the single in-progress draft between generation and send.
#[derive(Debug, Default)]
pub struct Composer {
    pub current: Option<EmailDraft>,
    /// Editable copy of the generated body, persisted only on send
    pub content: String,
    pub phase: Phase,
    pub message: Option<String>,
}

impl Composer {
    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Generating | Phase::Sending)
    }

    pub fn can_generate(request: &GenerateRequest) -> bool {
        !request.prompt.trim().is_empty() && !request.recipient.trim().is_empty()
    }

    /// Id of the current draft, if the backend assigned one
    pub fn current_id(&self) -> Option<i64> {
        self.current.as_ref().map(|draft| draft.id)
    }

    /// Requests a new draft. On success it replaces whatever draft was
    /// current; on failure the previous state is left as it was.
    pub async fn generate(
        &mut self,
        backend: &dyn Backend,
        request: GenerateRequest,
    ) -> Option<&EmailDraft> {
        if !Self::can_generate(&request) || self.is_busy() {
            return None;
        }

        let previous = self.phase;
        self.phase = Phase::Generating;

        match backend.generate(&request).await {
            Ok(response) => {
                let Some(id) = response.draft_id else {
                    warn!("backend generated content without a draft id");
                    self.phase = previous;
                    self.message = Some(GENERATE_FAILED.to_string());
                    return None;
                };
                info!(draft_id = id, "draft generated");
                self.content = response.content.clone();
                self.current = Some(EmailDraft {
                    id,
                    prompt: request.prompt,
                    content: response.content,
                    recipient: request.recipient,
                    tone: request.tone.as_str().to_string(),
                    email_type: request.email_type,
                    status: DraftStatus::Draft,
                    created_at: Utc::now().to_rfc3339(),
                    sent_at: None,
                    subject: None,
                });
                self.phase = Phase::DraftReady;
                self.message = None;
                self.current.as_ref()
            }
            Err(e) => {
                warn!("Error generating email: {}", e);
                self.phase = previous;
                self.message = Some(GENERATE_FAILED.to_string());
                None
            }
        }
    }

    pub fn edit_content(&mut self, text: String) {
        self.content = text;
    }

    /// Persists the edited body, then asks the backend to deliver it.
    /// A failed update stops before the send so stale content never goes out.
    pub async fn send_current(&mut self, backend: &dyn Backend) -> SendOutcome {
        let Some(draft) = self.current.as_ref() else {
            return SendOutcome::NoDraft;
        };
        let id = draft.id;
        if self.is_busy() || !draft.status.can_transition_to(DraftStatus::Sent) {
            return SendOutcome::NoDraft;
        }

        self.phase = Phase::Sending;
        let result = match backend.update_draft(id, &self.content).await {
            Ok(()) => backend.send_draft(id).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                info!(draft_id = id, "draft sent");
                self.current = None;
                self.content.clear();
                self.phase = Phase::Sent;
                self.message = Some(SEND_OK.to_string());
                SendOutcome::Sent(id)
            }
            Err(e) => {
                warn!("Error sending email {}: {}", id, e);
                self.phase = Phase::Failed;
                self.message = Some(SEND_FAILED.to_string());
                SendOutcome::Failed(id)
            }
        }
    }

    /// Pushes local edits to the backend without sending. Returns whether
    /// anything was written.
    pub async fn save_edits(&mut self, backend: &dyn Backend) -> Result<bool, ApiError> {
        let Some(draft) = self.current.as_mut() else {
            return Ok(false);
        };
        if draft.content == self.content {
            return Ok(false);
        }
        backend.update_draft(draft.id, &self.content).await?;
        draft.content = self.content.clone();
        info!(draft_id = draft.id, "draft edits saved");
        Ok(true)
    }

    pub fn discard(&mut self) {
        self.current = None;
        self.content.clear();
        self.phase = Phase::Idle;
        self.message = None;
    }
}
