use crate::config::Config;
use crate::models::Settings;
use crate::secrets::SecretStore;
use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsSection {
    Smtp,
    Preferences,
    Notifications,
}

impl SettingsSection {
    pub const ALL: [SettingsSection; 3] = [
        SettingsSection::Smtp,
        SettingsSection::Preferences,
        SettingsSection::Notifications,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            SettingsSection::Smtp => " SMTP Configuration ",
            SettingsSection::Preferences => " Preferences ",
            SettingsSection::Notifications => " Notifications ",
        }
    }

    /// Fields of this section, in form order
    pub fn fields(self) -> impl Iterator<Item = SettingsField> {
        SettingsField::ALL
            .into_iter()
            .filter(move |field| field.section() == self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettingsField {
    #[default]
    SmtpHost,
    SmtpPort,
    SmtpUsername,
    SmtpPassword,
    DefaultTone,
    Signature,
    AutoSave,
    NotifySent,
    NotifyDraftSaved,
    NotifyGenerated,
}

impl SettingsField {
    pub const ALL: [SettingsField; 10] = [
        SettingsField::SmtpHost,
        SettingsField::SmtpPort,
        SettingsField::SmtpUsername,
        SettingsField::SmtpPassword,
        SettingsField::DefaultTone,
        SettingsField::Signature,
        SettingsField::AutoSave,
        SettingsField::NotifySent,
        SettingsField::NotifyDraftSaved,
        SettingsField::NotifyGenerated,
    ];

    pub fn section(&self) -> SettingsSection {
        match self {
            SettingsField::SmtpHost
            | SettingsField::SmtpPort
            | SettingsField::SmtpUsername
            | SettingsField::SmtpPassword => SettingsSection::Smtp,
            SettingsField::DefaultTone | SettingsField::Signature | SettingsField::AutoSave => {
                SettingsSection::Preferences
            }
            _ => SettingsSection::Notifications,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SettingsField::SmtpHost => "SMTP Host",
            SettingsField::SmtpPort => "SMTP Port",
            SettingsField::SmtpUsername => "Username",
            SettingsField::SmtpPassword => "Password",
            SettingsField::DefaultTone => "Default Tone",
            SettingsField::Signature => "Email Signature",
            SettingsField::AutoSave => "Automatically save drafts",
            SettingsField::NotifySent => "Notify when email is sent",
            SettingsField::NotifyDraftSaved => "Notify when draft is saved",
            SettingsField::NotifyGenerated => "Notify when email generation is complete",
        }
    }

    pub fn is_toggle(&self) -> bool {
        matches!(
            self,
            SettingsField::AutoSave
                | SettingsField::NotifySent
                | SettingsField::NotifyDraftSaved
                | SettingsField::NotifyGenerated
        )
    }

    fn offset(self, step: isize) -> Self {
        let len = Self::ALL.len() as isize;
        let i = Self::ALL.iter().position(|f| *f == self).unwrap_or(0) as isize;
        Self::ALL[(i + step).rem_euclid(len) as usize]
    }
}

/// Local working copy of the settings; nothing leaves it until `save`.
#[derive(Debug, Default)]
pub struct SettingsForm {
    pub saved: Settings,
    pub draft: Settings,
    pub field: SettingsField,
}

impl SettingsForm {
    pub fn new(settings: Settings) -> Self {
        Self {
            saved: settings.clone(),
            draft: settings,
            field: SettingsField::default(),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.draft != self.saved
    }

    pub fn next_field(&mut self) {
        self.field = self.field.offset(1);
    }

    pub fn prev_field(&mut self) {
        self.field = self.field.offset(-1);
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.field {
            SettingsField::SmtpHost => Some(&mut self.draft.smtp_host),
            SettingsField::SmtpUsername => Some(&mut self.draft.smtp_username),
            SettingsField::SmtpPassword => Some(&mut self.draft.smtp_password),
            SettingsField::Signature => Some(&mut self.draft.email_signature),
            _ => None,
        }
    }

    pub fn input_char(&mut self, c: char) {
        if self.field == SettingsField::SmtpPort {
            // Digits only, and nothing that overflows a port
            if let Some(digit) = c.to_digit(10) {
                let port = u32::from(self.draft.smtp_port) * 10 + digit;
                if let Ok(port) = u16::try_from(port) {
                    self.draft.smtp_port = port;
                }
            }
            return;
        }
        if c == ' ' && self.field.is_toggle() {
            self.toggle();
            return;
        }
        if let Some(text) = self.text_mut() {
            text.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.field == SettingsField::SmtpPort {
            self.draft.smtp_port /= 10;
            return;
        }
        if let Some(text) = self.text_mut() {
            text.pop();
        }
    }

    /// Only the signature is multi-line
    pub fn newline(&mut self) {
        if self.field == SettingsField::Signature {
            self.draft.email_signature.push('\n');
        } else if self.field.is_toggle() {
            self.toggle();
        }
    }

    pub fn toggle(&mut self) {
        let prefs = &mut self.draft.notification_preferences;
        match self.field {
            SettingsField::AutoSave => self.draft.auto_save_drafts = !self.draft.auto_save_drafts,
            SettingsField::NotifySent => prefs.email_sent = !prefs.email_sent,
            SettingsField::NotifyDraftSaved => prefs.draft_saved = !prefs.draft_saved,
            SettingsField::NotifyGenerated => {
                prefs.generation_complete = !prefs.generation_complete
            }
            _ => {}
        }
    }

    pub fn cycle_tone(&mut self, forward: bool) {
        if self.field != SettingsField::DefaultTone {
            return;
        }
        let tone = self.draft.default_tone;
        self.draft.default_tone = if forward { tone.next() } else { tone.prev() };
    }

    pub fn revert(&mut self) {
        self.draft = self.saved.clone();
    }

    /// Writes the password into the secret store, then the non-secret fields
    /// into the config file. Either both land or neither does.
    pub fn save(
        &mut self,
        config: &mut Config,
        path: &Path,
        secrets: &dyn SecretStore,
    ) -> Result<()> {
        let password_changed = self.draft.smtp_password != self.saved.smtp_password;
        if password_changed {
            secrets.store_password(&self.draft.smtp_password)?;
        }

        let mut updated = config.clone();
        updated.settings = self.draft.clone();
        if let Err(e) = updated.save_to(path) {
            if password_changed {
                if let Err(restore) = secrets.store_password(&self.saved.smtp_password) {
                    warn!("Could not restore previous SMTP password: {:#}", restore);
                }
            }
            return Err(e);
        }

        *config = updated;
        self.saved = self.draft.clone();
        info!(path = %path.display(), "settings saved");
        Ok(())
    }
}

/// Loads saved settings, pulling the password back out of the secret store.
pub fn load_settings(config: &Config, secrets: &dyn SecretStore) -> Settings {
    let mut settings = config.settings.clone();
    match secrets.load_password() {
        Ok(Some(password)) => settings.smtp_password = password,
        Ok(None) => {}
        Err(e) => warn!("Could not read SMTP password: {}", e),
    }
    settings
}
