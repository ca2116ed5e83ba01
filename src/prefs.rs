//! Display preferences: colour theme and font size.
//!
//! Stored under their own keys, separately from the registry. The task core
//! never reads them.

use crate::error::StorageError;
use crate::store::Storage;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

pub const THEME_KEY: &str = "treeflow_theme";
pub const FONT_SIZE_KEY: &str = "treeflow_fontsize";

pub const FONT_SIZE_MIN: u8 = 11;
pub const FONT_SIZE_MAX: u8 = 20;
pub const FONT_SIZE_DEFAULT: u8 = 14;
pub const FONT_SIZE_STEP: i32 = 1;

/// Colour theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    /// Anything other than "light" is treated as dark.
    pub fn parse(s: &str) -> Self {
        match s.trim().trim_matches('"').to_lowercase().as_str() {
            "light" => Theme::Light,
            _ => Theme::Dark,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clamp any requested size into the supported range.
pub fn clamp_font_size(size: i64) -> u8 {
    size.clamp(i64::from(FONT_SIZE_MIN), i64::from(FONT_SIZE_MAX)) as u8
}

/// Parse a stored font size. Zero or garbage means "not set".
fn parse_font_size(raw: &str) -> u8 {
    match raw.trim().trim_matches('"').parse::<i64>() {
        Ok(size) if size != 0 => clamp_font_size(size),
        _ => FONT_SIZE_DEFAULT,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Preferences {
    pub theme: Theme,
    pub font_size: u8,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            font_size: FONT_SIZE_DEFAULT,
        }
    }
}

impl Preferences {
    /// Load both preferences, using defaults for anything missing or unreadable.
    pub fn load(storage: &dyn Storage) -> Self {
        let theme = storage
            .read(THEME_KEY)
            .ok()
            .flatten()
            .map(|raw| Theme::parse(&raw))
            .unwrap_or_default();
        let font_size = storage
            .read(FONT_SIZE_KEY)
            .ok()
            .flatten()
            .map(|raw| parse_font_size(&raw))
            .unwrap_or(FONT_SIZE_DEFAULT);
        Self { theme, font_size }
    }

    pub fn toggle_theme(&mut self, storage: &mut dyn Storage) -> Result<Theme, StorageError> {
        let next = self.theme.toggled();
        storage.write(THEME_KEY, &format!("\"{}\"", next))?;
        self.theme = next;
        debug!(theme = %next, "Theme toggled");
        Ok(next)
    }

    /// Adjust the font size by `delta`, clamped to the supported range.
    pub fn change_font_size(
        &mut self,
        delta: i32,
        storage: &mut dyn Storage,
    ) -> Result<u8, StorageError> {
        let next = clamp_font_size(i64::from(self.font_size) + i64::from(delta));
        storage.write(FONT_SIZE_KEY, &next.to_string())?;
        self.font_size = next;
        debug!(font_size = next, "Font size changed");
        Ok(next)
    }

    pub fn at_min(&self) -> bool {
        self.font_size <= FONT_SIZE_MIN
    }

    pub fn at_max(&self) -> bool {
        self.font_size >= FONT_SIZE_MAX
    }
}
