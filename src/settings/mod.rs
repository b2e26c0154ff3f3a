// ── Persisted view settings ───────────────────────────────────────────────────
//
// Reads and writes `<config dir>/tack/settings.json`.
// No `unsafe`: pure safe Rust + serde_json.
//
// `Settings` is an immutable value: it is loaded once at startup, handed to
// whatever needs it by reference, and replaced wholesale when the user
// changes the font or toggles line numbers.  Persisting is always an explicit
// `SettingsStore::save` call.

use std::{fmt, fs, io, path::PathBuf, str::FromStr};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::Result;

// ── FontSpec ──────────────────────────────────────────────────────────────────

/// Editor font, stored in settings as a descriptor string such as
/// `"Consolas 11"` or `"DejaVu Sans Mono bold italic 10"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontSpec {
    pub face: String,
    /// Size in points.
    pub size: u32,
    pub bold: bool,
    pub italic: bool,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            face: "Consolas".to_owned(),
            size: 11,
            bold: false,
            italic: false,
        }
    }
}

impl fmt::Display for FontSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.face)?;
        if self.bold {
            f.write_str(" bold")?;
        }
        if self.italic {
            f.write_str(" italic")?;
        }
        write!(f, " {}", self.size)
    }
}

/// Why a font descriptor could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FontParseError {
    #[error("font descriptor has no face name")]
    MissingFace,
    #[error("font descriptor must end with a point size")]
    MissingSize,
}

impl FromStr for FontSpec {
    type Err = FontParseError;

    /// `<face words> [bold] [italic] <size>`; style words are
    /// case-insensitive and may appear in either order.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut words: Vec<&str> = s.split_whitespace().collect();
        let size = words
            .pop()
            .and_then(|w| w.parse::<u32>().ok())
            .filter(|&n| n > 0)
            .ok_or(FontParseError::MissingSize)?;

        let (mut bold, mut italic) = (false, false);
        while let Some(last) = words.last() {
            if last.eq_ignore_ascii_case("bold") {
                bold = true;
            } else if last.eq_ignore_ascii_case("italic") {
                italic = true;
            } else {
                break;
            }
            words.pop();
        }
        if words.is_empty() {
            return Err(FontParseError::MissingFace);
        }

        Ok(Self {
            face: words.join(" "),
            size,
            bold,
            italic,
        })
    }
}

// ── Settings ──────────────────────────────────────────────────────────────────

/// Root of the JSON settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Font descriptor, see `FontSpec`.
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default)]
    pub show_line_numbers: bool,
}

fn default_font() -> String {
    FontSpec::default().to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            font: default_font(),
            show_line_numbers: false,
        }
    }
}

impl Settings {
    /// The configured font, or the default if the descriptor is unusable.
    pub fn font_spec(&self) -> FontSpec {
        self.font.parse().unwrap_or_else(|e| {
            warn!("ignoring font {:?}: {e}", self.font);
            FontSpec::default()
        })
    }

    pub fn with_font(&self, font: &FontSpec) -> Self {
        Self {
            font: font.to_string(),
            ..self.clone()
        }
    }

    pub fn with_line_numbers(&self, show: bool) -> Self {
        Self {
            show_line_numbers: show,
            ..self.clone()
        }
    }
}

// ── SettingsStore ─────────────────────────────────────────────────────────────

/// Location of the settings file on disk.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// `<config dir>/tack/settings.json`, e.g. `%APPDATA%\tack\settings.json`
    /// on Windows or `~/.config/tack/settings.json` on Linux.
    ///
    /// Returns `None` if the platform has no config directory.
    pub fn default_location() -> Option<Self> {
        let mut p = dirs::config_dir()?;
        p.push("tack");
        p.push("settings.json");
        Some(Self::new(p))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Read the settings file.  A missing file yields the defaults; a
    /// malformed one is an error.
    pub fn load(&self) -> Result<Settings> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no settings at {}, using defaults", self.path.display());
                return Ok(Settings::default());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&data)?)
    }

    /// Write `settings`, creating the parent directory if needed.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = fs::File::create(&self.path)?;
        serde_json::to_writer_pretty(file, settings)?;
        debug!("settings saved to {}", self.path.display());
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TackError;

    fn store_in(dir: &tempfile::TempDir) -> SettingsStore {
        SettingsStore::new(dir.path().join("nested").join("settings.json"))
    }

    #[test]
    fn font_descriptor_parses_multiword_face() {
        let f: FontSpec = "DejaVu Sans Mono bold italic 10".parse().unwrap();
        assert_eq!(f.face, "DejaVu Sans Mono");
        assert_eq!(f.size, 10);
        assert!(f.bold && f.italic);
        assert_eq!(f.to_string(), "DejaVu Sans Mono bold italic 10");
    }

    #[test]
    fn font_descriptor_errors() {
        assert_eq!("Consolas".parse::<FontSpec>(), Err(FontParseError::MissingSize));
        assert_eq!("bold 12".parse::<FontSpec>(), Err(FontParseError::MissingFace));
        assert_eq!("Consolas 0".parse::<FontSpec>(), Err(FontParseError::MissingSize));
    }

    #[test]
    fn unusable_font_falls_back_to_default() {
        let s = Settings {
            font: "not a font".into(),
            show_line_numbers: false,
        };
        assert_eq!(s.font_spec(), FontSpec::default());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.load().unwrap(), Settings::default());
    }

    #[test]
    fn save_then_load_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let font: FontSpec = "Fira Code 14".parse().unwrap();
        let settings = Settings::default().with_font(&font).with_line_numbers(true);
        store.save(&settings).unwrap();
        assert!(store.path().exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.font_spec(), font);
    }

    #[test]
    fn missing_keys_take_defaults() {
        let s: Settings = serde_json::from_str(r#"{"show_line_numbers":true}"#).unwrap();
        assert!(s.show_line_numbers);
        assert_eq!(s.font, default_font());
    }

    #[test]
    fn malformed_file_is_settings_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        fs::write(store.path(), b"{ nope").unwrap();
        assert!(matches!(store.load(), Err(TackError::Settings(_))));
    }

    #[test]
    fn with_methods_leave_original_untouched() {
        let base = Settings::default();
        let toggled = base.with_line_numbers(true);
        assert!(!base.show_line_numbers);
        assert!(toggled.show_line_numbers);
        assert_eq!(toggled.font, base.font);
    }
}
