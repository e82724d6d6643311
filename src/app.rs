use crate::api::Backend;
use crate::composer::{Composer, SEND_FAILED, SEND_OK, SendOutcome};
use crate::config::{Config, matches_key};
use crate::history::HistoryView;
use crate::secrets::SecretStore;
use crate::settings::SettingsForm;
use crate::store::DraftStore;
use crate::ui::{ComposeField, ComposeState};
use crossterm::event::{KeyCode, KeyEvent};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Tab {
    #[default]
    Compose,
    History,
    Stats,
    Settings,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Compose, Tab::History, Tab::Stats, Tab::Settings];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Compose => "Compose",
            Tab::History => "History",
            Tab::Stats => "Analytics",
            Tab::Settings => "Settings",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    fn offset(self, step: isize) -> Self {
        let len = Self::ALL.len() as isize;
        Self::ALL[(self.index() as isize + step).rem_euclid(len) as usize]
    }
}

/// Work that needs the backend. The run loop redraws before awaiting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Refresh,
    Generate,
    Send,
    SaveDraft,
    Delete(i64),
}

impl Command {
    pub fn pending_label(&self) -> &'static str {
        match self {
            Command::Refresh => "Refreshing…",
            Command::Generate => "Generating…",
            Command::Send => "Sending…",
            Command::SaveDraft => "Saving draft…",
            Command::Delete(_) => "Deleting…",
        }
    }
}

pub struct App {
    pub backend: Arc<dyn Backend>,
    pub secrets: Box<dyn SecretStore>,
    pub config: Config,
    pub config_path: PathBuf,
    pub tab: Tab,
    pub store: DraftStore,
    pub composer: Composer,
    pub compose: ComposeState,
    pub history: HistoryView,
    pub settings: SettingsForm,
    pub status_message: Option<String>,
    pub pending: Option<&'static str>,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        backend: Arc<dyn Backend>,
        secrets: Box<dyn SecretStore>,
        config: Config,
        config_path: PathBuf,
    ) -> Self {
        let settings = crate::settings::load_settings(&config, secrets.as_ref());
        Self {
            backend,
            secrets,
            compose: ComposeState::new(settings.default_tone),
            settings: SettingsForm::new(settings),
            config,
            config_path,
            tab: Tab::default(),
            store: DraftStore::default(),
            composer: Composer::default(),
            history: HistoryView::default(),
            status_message: None,
            pending: None,
            should_quit: false,
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        let bindings = self.config.keybindings.clone();

        if matches_key(key, &bindings.quit) {
            self.should_quit = true;
            return None;
        }

        let requested_tab = if matches_key(key, &bindings.next_tab) {
            Some(self.tab.offset(1))
        } else if matches_key(key, &bindings.prev_tab) {
            Some(self.tab.offset(-1))
        } else if matches_key(key, &bindings.compose_tab) {
            Some(Tab::Compose)
        } else if matches_key(key, &bindings.history_tab) {
            Some(Tab::History)
        } else if matches_key(key, &bindings.stats_tab) {
            Some(Tab::Stats)
        } else if matches_key(key, &bindings.settings_tab) {
            Some(Tab::Settings)
        } else {
            None
        };
        if let Some(tab) = requested_tab {
            return self.switch_tab(tab);
        }

        match self.tab {
            Tab::Compose => self.handle_compose_key(key),
            Tab::History => self.handle_history_key(key),
            Tab::Stats => {
                if matches_key(key, &bindings.refresh) {
                    Some(Command::Refresh)
                } else {
                    None
                }
            }
            Tab::Settings => {
                self.handle_settings_key(key);
                None
            }
        }
    }

    fn switch_tab(&mut self, tab: Tab) -> Option<Command> {
        let leaving_compose = self.tab == Tab::Compose && tab != Tab::Compose;
        self.tab = tab;
        self.history.editing_search = false;
        if leaving_compose && self.settings.saved.auto_save_drafts && self.has_unsaved_edits() {
            return Some(Command::SaveDraft);
        }
        None
    }

    fn has_unsaved_edits(&self) -> bool {
        self.composer
            .current
            .as_ref()
            .is_some_and(|draft| draft.content != self.composer.content)
    }

    fn handle_compose_key(&mut self, key: KeyEvent) -> Option<Command> {
        let bindings = &self.config.keybindings;

        if matches_key(key, &bindings.generate) {
            let request = self.compose.request();
            if Composer::can_generate(&request) && !self.composer.is_busy() {
                return Some(Command::Generate);
            }
            return None;
        }
        if matches_key(key, &bindings.send_message) {
            return self.composer.current_id().map(|_| Command::Send);
        }
        if matches_key(key, &bindings.discard) {
            self.composer.discard();
            self.compose.set_body("");
            self.compose.clamp_focus(false);
            return None;
        }

        let has_draft = self.composer.current.is_some();
        if matches_key(key, &bindings.next_field) {
            self.compose.next_field(has_draft);
            return None;
        }
        if matches_key(key, &bindings.prev_field) {
            self.compose.prev_field(has_draft);
            return None;
        }

        match self.compose.focused_field {
            ComposeField::Type => {
                if matches!(key.code, KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')) {
                    self.compose.email_type = self.compose.email_type.toggle();
                    self.compose.refresh_placeholder();
                }
            }
            ComposeField::Tone => match key.code {
                KeyCode::Left => self.compose.tone = self.compose.tone.prev(),
                KeyCode::Right | KeyCode::Char(' ') => self.compose.tone = self.compose.tone.next(),
                _ => {}
            },
            ComposeField::Recipient => {
                if key.code == KeyCode::Enter {
                    self.compose.next_field(has_draft);
                } else {
                    self.compose.recipient.input(key);
                }
            }
            ComposeField::Prompt => {
                self.compose.prompt.input(key);
            }
            ComposeField::Body => {
                // The composer keeps the generated text byte for byte until the body is edited
                if self.compose.body.input(key) {
                    self.composer.edit_content(self.compose.body_text());
                }
            }
        }
        None
    }

    fn handle_history_key(&mut self, key: KeyEvent) -> Option<Command> {
        let bindings = &self.config.keybindings;
        let emails = &self.store.emails;

        if self.history.viewing.is_some() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                self.history.viewing = None;
            }
            return None;
        }

        if self.history.editing_search {
            match key.code {
                KeyCode::Esc | KeyCode::Enter => self.history.editing_search = false,
                KeyCode::Backspace => self.history.pop_search(),
                KeyCode::Char(c) => self.history.push_search(c),
                _ => {}
            }
            return None;
        }

        if matches_key(key, &bindings.search) {
            self.history.editing_search = true;
        } else if matches_key(key, &bindings.status_filter) {
            self.history.cycle_status();
        } else if matches_key(key, &bindings.tone_filter) {
            self.history.cycle_tone();
        } else if matches_key(key, &bindings.move_down) {
            self.history.move_down(emails);
        } else if matches_key(key, &bindings.move_up) {
            self.history.move_up();
        } else if matches_key(key, &bindings.view) {
            self.history.viewing = self.history.selected_id(emails);
        } else if matches_key(key, &bindings.delete) {
            return self.history.selected_id(emails).map(Command::Delete);
        } else if matches_key(key, &bindings.refresh) {
            return Some(Command::Refresh);
        } else if key.code == KeyCode::Esc {
            self.history.filter = Default::default();
            self.history.selected = 0;
        }
        None
    }

    fn handle_settings_key(&mut self, key: KeyEvent) {
        if matches_key(key, &self.config.keybindings.save_settings) {
            self.save_settings();
            return;
        }
        let form = &mut self.settings;
        match key.code {
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Left => form.cycle_tone(false),
            KeyCode::Right => form.cycle_tone(true),
            KeyCode::Enter => form.newline(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Esc => form.revert(),
            KeyCode::Char(c) => form.input_char(c),
            _ => {}
        }
    }

    fn save_settings(&mut self) {
        let path = self.config_path.clone();
        match self
            .settings
            .save(&mut self.config, &path, self.secrets.as_ref())
        {
            Ok(()) => self.set_status("Settings saved"),
            Err(e) => {
                warn!("Error saving settings: {:#}", e);
                self.set_status("Failed to save settings");
            }
        }
    }

    /// Runs one backend command to completion.
    pub async fn execute(&mut self, command: Command) {
        self.pending = None;
        match command {
            Command::Refresh => {
                self.store.refresh(self.backend.as_ref()).await;
                self.history.clamp(&self.store.emails);
                if let Some(error) = self.store.last_error.clone() {
                    self.set_status(error);
                }
            }
            Command::Generate => self.generate().await,
            Command::Send => self.send_current().await,
            Command::SaveDraft => self.save_draft().await,
            Command::Delete(id) => self.delete(id).await,
        }
    }

    async fn generate(&mut self) {
        let request = self.compose.request();
        let generated = self
            .composer
            .generate(self.backend.as_ref(), request)
            .await
            .map(|draft| draft.id);

        let Some(id) = generated else {
            if let Some(message) = self.composer.message.clone() {
                self.set_status(message);
            }
            return;
        };

        let content = self.composer.content.clone();
        self.compose.set_body(&content);
        self.compose.focused_field = ComposeField::Body;

        let prefs = &self.settings.saved.notification_preferences;
        let mut notes = Vec::new();
        if prefs.generation_complete {
            notes.push("Email generated.".to_string());
        }
        if prefs.draft_saved {
            notes.push(format!("Draft #{} saved.", id));
        }
        if !notes.is_empty() {
            self.set_status(notes.join(" "));
        }

        self.store.refresh(self.backend.as_ref()).await;
    }

    async fn send_current(&mut self) {
        match self.composer.send_current(self.backend.as_ref()).await {
            SendOutcome::NoDraft => {}
            SendOutcome::Sent(id) => {
                info!(draft_id = id, "email sent");
                self.compose.set_body("");
                self.compose.clamp_focus(false);
                if self.settings.saved.notification_preferences.email_sent {
                    self.set_status(SEND_OK);
                }
                self.store.refresh(self.backend.as_ref()).await;
            }
            SendOutcome::Failed(_) => self.set_status(SEND_FAILED),
        }
    }

    async fn save_draft(&mut self) {
        match self.composer.save_edits(self.backend.as_ref()).await {
            Ok(true) => {
                if self.settings.saved.notification_preferences.draft_saved {
                    self.set_status("Draft saved.");
                }
                self.store.refresh_emails(self.backend.as_ref()).await;
            }
            Ok(false) => {}
            Err(_) => self.set_status("Failed to save draft."),
        }
    }

    async fn delete(&mut self, id: i64) {
        match self.store.delete(self.backend.as_ref(), id).await {
            Ok(()) => {
                if self.history.viewing == Some(id) {
                    self.history.viewing = None;
                }
                self.history.clamp(&self.store.emails);
                self.set_status(format!("Deleted email #{}", id));
            }
            Err(_) => self.set_status("Failed to delete email."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::FakeBackend;
    use crate::models::{DraftStatus, Tone};
    use crate::secrets::testing::MemoryStore;
    use crate::store::draft;
    use crossterm::event::KeyModifiers;

    fn app_with(backend: Arc<FakeBackend>) -> App {
        App::new(
            backend,
            Box::new(MemoryStore::default()),
            Config::default(),
            std::env::temp_dir().join("egtui-app-test.toml"),
        )
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn fill_form(app: &mut App) {
        app.compose.focused_field = ComposeField::Recipient;
        type_text(app, "boss@co.com");
        app.compose.focused_field = ComposeField::Prompt;
        type_text(app, "Ask for a deadline extension");
    }

    #[test]
    fn test_generate_disabled_until_form_filled() {
        let mut app = app_with(Arc::new(FakeBackend::default()));
        assert_eq!(app.handle_key(ctrl('g')), None);
        fill_form(&mut app);
        assert_eq!(app.handle_key(ctrl('g')), Some(Command::Generate));
    }

    #[test]
    fn test_send_without_draft_issues_no_command() {
        let backend = Arc::new(FakeBackend::default());
        let mut app = app_with(backend.clone());
        assert_eq!(app.handle_key(ctrl('s')), None);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_generate_then_send_round() {
        let backend = Arc::new(FakeBackend::default());
        *backend.next_draft_id.lock().unwrap() = Some(12);
        let mut app = app_with(backend.clone());
        fill_form(&mut app);

        app.execute(Command::Generate).await;
        assert_eq!(app.composer.current_id(), Some(12));
        assert_eq!(app.compose.focused_field, ComposeField::Body);
        assert!(app.compose.body_text().contains("Ask for a deadline extension"));

        type_text(&mut app, "!");
        let command = app.handle_key(ctrl('s'));
        assert_eq!(command, Some(Command::Send));
        app.execute(Command::Send).await;

        assert_eq!(
            backend.calls(),
            vec![
                "POST /generate",
                "GET /emails",
                "GET /stats",
                "POST /update_draft/12",
                "POST /send/12",
                "GET /emails",
                "GET /stats",
            ]
        );
        assert!(app.composer.current.is_none());
        assert_eq!(app.status_message.as_deref(), Some(SEND_OK));
    }

    #[tokio::test]
    async fn test_delete_from_history() {
        let emails = vec![
            draft(1, DraftStatus::Sent, Tone::Formal),
            draft(2, DraftStatus::Draft, Tone::Casual),
        ];
        let backend = Arc::new(FakeBackend::with_emails(emails));
        let mut app = app_with(backend.clone());
        app.execute(Command::Refresh).await;

        app.handle_key(key(KeyCode::F(2)));
        assert_eq!(app.tab, Tab::History);
        app.handle_key(key(KeyCode::Down));
        let command = app.handle_key(key(KeyCode::Delete));
        assert_eq!(command, Some(Command::Delete(2)));

        app.execute(Command::Delete(2)).await;
        let ids: Vec<i64> = app.store.emails.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1]);
        assert_eq!(app.history.selected, 0);
    }

    #[test]
    fn test_search_mode_captures_filter_keys() {
        let mut app = app_with(Arc::new(FakeBackend::default()));
        app.tab = Tab::History;
        app.handle_key(key(KeyCode::Char('/')));
        type_text(&mut app, "st");
        assert_eq!(app.history.filter.search, "st");
        assert_eq!(app.history.filter.status, Default::default());
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Char('s')));
        assert_ne!(app.history.filter.status, Default::default());
    }

    #[tokio::test]
    async fn test_leaving_compose_autosaves_edits() {
        let backend = Arc::new(FakeBackend::default());
        *backend.next_draft_id.lock().unwrap() = Some(3);
        let mut app = app_with(backend.clone());
        fill_form(&mut app);
        app.execute(Command::Generate).await;
        type_text(&mut app, " edited");

        let command = app.handle_key(key(KeyCode::F(3)));
        assert_eq!(command, Some(Command::SaveDraft));
        app.execute(Command::SaveDraft).await;
        assert!(backend.calls().contains(&"POST /update_draft/3".to_string()));

        app.tab = Tab::Compose;
        assert_eq!(app.handle_key(key(KeyCode::F(3))), None);
    }

    #[tokio::test]
    async fn test_unedited_draft_is_sent_verbatim() {
        let backend = Arc::new(FakeBackend::default());
        *backend.next_draft_id.lock().unwrap() = Some(21);
        let generated = "Dear Sam,\r\n\r\nSee you Monday.\r\n";
        *backend.next_content.lock().unwrap() = Some(generated.to_string());
        let mut app = app_with(backend.clone());
        fill_form(&mut app);

        app.execute(Command::Generate).await;
        assert_eq!(app.handle_key(key(KeyCode::F(2))), None);
        app.tab = Tab::Compose;
        app.execute(Command::Send).await;

        assert_eq!(backend.updates(), vec![(21, generated.to_string())]);
    }

    #[test]
    fn test_quit_binding() {
        let mut app = app_with(Arc::new(FakeBackend::default()));
        app.handle_key(ctrl('q'));
        assert!(app.should_quit);
    }
}
