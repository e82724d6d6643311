use crate::api::DEFAULT_BASE_URL;
use crate::models::Settings;
use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

pub const CONFIG_PATH: &str = "settings.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub keybindings: Keybindings,
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Keybindings {
    pub next_tab: Vec<String>,
    pub prev_tab: Vec<String>,
    pub compose_tab: Vec<String>,
    pub history_tab: Vec<String>,
    pub stats_tab: Vec<String>,
    pub settings_tab: Vec<String>,
    pub move_up: Vec<String>,
    pub move_down: Vec<String>,
    pub next_field: Vec<String>,
    pub prev_field: Vec<String>,
    pub generate: Vec<String>,
    pub send_message: Vec<String>,
    pub discard: Vec<String>,
    pub search: Vec<String>,
    pub status_filter: Vec<String>,
    pub tone_filter: Vec<String>,
    pub view: Vec<String>,
    pub delete: Vec<String>,
    pub refresh: Vec<String>,
    pub save_settings: Vec<String>,
    pub quit: Vec<String>,
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|k| k.to_string()).collect()
}

impl Default for Keybindings {
    fn default() -> Self {
        Self {
            next_tab: keys(&["ctrl-n", "ctrl-Right"]),
            prev_tab: keys(&["ctrl-p", "ctrl-Left"]),
            compose_tab: keys(&["F1"]),
            history_tab: keys(&["F2"]),
            stats_tab: keys(&["F3"]),
            settings_tab: keys(&["F4"]),
            move_up: keys(&["k", "Up"]),
            move_down: keys(&["j", "Down"]),
            next_field: keys(&["Tab"]),
            prev_field: keys(&["BackTab"]),
            generate: keys(&["ctrl-g"]),
            send_message: keys(&["ctrl-s"]),
            discard: keys(&["ctrl-d"]),
            search: keys(&["/"]),
            status_filter: keys(&["s"]),
            tone_filter: keys(&["t"]),
            view: keys(&["Enter"]),
            delete: keys(&["Delete", "d"]),
            refresh: keys(&["r"]),
            save_settings: keys(&["ctrl-s"]),
            quit: keys(&["ctrl-q", "ctrl-c"]),
        }
    }
}

pub fn parse_key_string(key_str: &str) -> (KeyCode, KeyModifiers) {
    let mut parts: Vec<&str> = key_str.split('-').collect();
    let mut modifiers = KeyModifiers::empty();

    // Base key is last; everything before it is a modifier
    let base_key_str = parts.pop().unwrap_or("");

    for part in parts {
        match part.to_lowercase().as_str() {
            "ctrl" => modifiers.insert(KeyModifiers::CONTROL),
            "alt" => modifiers.insert(KeyModifiers::ALT),
            "shift" => modifiers.insert(KeyModifiers::SHIFT),
            "cmd" | "command" | "super" => modifiers.insert(KeyModifiers::SUPER),
            "meta" => modifiers.insert(KeyModifiers::META),
            _ => {}
        }
    }

    let code = match base_key_str {
        "Backspace" => KeyCode::Backspace,
        "Delete" => KeyCode::Delete,
        "Enter" => KeyCode::Enter,
        "Left" => KeyCode::Left,
        "Right" => KeyCode::Right,
        "Up" => KeyCode::Up,
        "Down" => KeyCode::Down,
        "Tab" => KeyCode::Tab,
        "BackTab" => KeyCode::BackTab,
        "Esc" => KeyCode::Esc,
        " " | "Space" => KeyCode::Char(' '),
        s if s.len() > 1 && s.starts_with('F') => match s[1..].parse::<u8>() {
            Ok(n) => KeyCode::F(n),
            Err(_) => KeyCode::Null,
        },
        s => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => KeyCode::Null,
            }
        }
    };

    (code, modifiers)
}

pub fn matches_key(event: KeyEvent, bindings: &[String]) -> bool {
    bindings.iter().any(|b| {
        let (code, modifiers) = parse_key_string(b);
        code != KeyCode::Null && event.code == code && event.modifiers.contains(modifiers)
    })
}

impl Config {
    pub fn load() -> Self {
        Self::load_from(CONFIG_PATH)
    }

    /// Falls back to defaults when the file is missing or unreadable.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Ignoring invalid config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
