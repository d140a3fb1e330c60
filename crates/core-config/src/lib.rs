//! Configuration loading (`ferrite.toml`) and per-user state paths.
//!
//! Lookup order: explicit `--config` path, then `./ferrite.toml`, then
//! `<config_dir>/ferrite/ferrite.toml`. A missing file yields defaults; a file
//! that exists but cannot be read or parsed is a startup error. Unknown keys
//! are ignored.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

pub const CONFIG_FILE_NAME: &str = "ferrite.toml";
const APP_DIR: &str = "ferrite";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum LineNumbers {
    #[serde(rename = "off")]
    Off,
    #[default]
    #[serde(rename = "abs")]
    Absolute,
    #[serde(rename = "rel")]
    Relative,
}

impl LineNumbers {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "off" => Some(LineNumbers::Off),
            "abs" => Some(LineNumbers::Absolute),
            "rel" => Some(LineNumbers::Relative),
            _ => None,
        }
    }

    /// off → abs → rel → off.
    pub fn cycle(self) -> Self {
        match self {
            LineNumbers::Off => LineNumbers::Absolute,
            LineNumbers::Absolute => LineNumbers::Relative,
            LineNumbers::Relative => LineNumbers::Off,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineNumbers::Off => "off",
            LineNumbers::Absolute => "abs",
            LineNumbers::Relative => "rel",
        }
    }
    /// Gutter columns for a document of `line_count` lines, separator included.
    pub fn gutter_width(self, line_count: usize) -> usize {
        match self {
            LineNumbers::Off => 0,
            _ => line_count.max(1).to_string().len().max(3) + 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub indent_unit: String,
    pub line_numbers: LineNumbers,
    pub large_file_threshold: usize,
    pub scroll_margin: u16,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            indent_unit: "    ".to_string(),
            line_numbers: LineNumbers::default(),
            large_file_threshold: 8 * 1024 * 1024,
            scroll_margin: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub tick_ms: u64,
    pub git_poll_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_ms: 250,
            git_poll_secs: 2,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    pub normal: HashMap<String, String>,
    pub insert: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub editor: EditorConfig,
    pub runtime: RuntimeConfig,
    pub keys: KeysConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// File the values came from; `None` when defaults are in effect.
    pub source: Option<PathBuf>,
    pub file: ConfigFile,
    /// `scroll_margin` clamped to the current text area.
    pub effective_scroll_margin: u16,
}

/// Best-effort config path: local file first, then the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    match dirs::config_dir() {
        Some(dir) => dir.join(APP_DIR).join(CONFIG_FILE_NAME),
        None => local,
    }
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(target: "config", path = %path.display(), "no config file; using defaults");
            return Ok(Config::default());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("reading config {}", path.display()));
        }
    };
    let file: ConfigFile =
        toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))?;
    info!(target: "config", path = %path.display(), "config loaded");
    Ok(Config {
        source: Some(path),
        file,
        effective_scroll_margin: 0,
    })
}

impl Config {
    /// Clamp the configured margin to `(text_rows - 2) / 2`. Returns the
    /// effective value.
    pub fn apply_text_rows(&mut self, text_rows: u16) -> u16 {
        let raw = self.file.editor.scroll_margin;
        let max = if text_rows <= 3 {
            0
        } else {
            (text_rows - 2) / 2
        };
        let clamped = raw.min(max);
        if clamped != raw {
            info!(target: "config", raw, clamped, max, text_rows, "scroll_margin_clamped");
        }
        self.effective_scroll_margin = clamped;
        clamped
    }
}

/// Per-user state locations. Every accessor returns `None` when persistence
/// is disabled.
#[derive(Debug, Clone, Default)]
pub struct StatePaths {
    root: Option<PathBuf>,
}

impl StatePaths {
    pub fn discover() -> Self {
        Self {
            root: dirs::config_dir().map(|d| d.join(APP_DIR)),
        }
    }

    pub fn at(root: &Path) -> Self {
        Self {
            root: Some(root.to_path_buf()),
        }
    }

    pub fn disabled() -> Self {
        Self { root: None }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn changelog_dir(&self) -> Option<PathBuf> {
        self.root.as_ref().map(|r| r.join("changelog"))
    }

    pub fn command_history(&self) -> Option<PathBuf> {
        self.root.as_ref().map(|r| r.join("command_history"))
    }

    pub fn search_history(&self) -> Option<PathBuf> {
        self.root.as_ref().map(|r| r.join("search_history"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl Write for LockedWriter<'_> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = LockedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            LockedWriter {
                guard: self.inner.lock().expect("log buffer poisoned"),
            }
        }
    }

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), body).unwrap();
        tmp
    }

    #[test]
    fn defaults_when_file_missing() {
        let cfg = load_from(Some(PathBuf::from("__no_such_ferrite__.toml"))).unwrap();
        assert!(cfg.source.is_none());
        assert_eq!(cfg.file.editor.indent_unit, "    ");
        assert_eq!(cfg.file.editor.line_numbers, LineNumbers::Absolute);
        assert_eq!(cfg.file.editor.large_file_threshold, 8 * 1024 * 1024);
        assert_eq!(cfg.file.runtime.tick_ms, 250);
        assert_eq!(cfg.file.runtime.git_poll_secs, 2);
        assert!(cfg.file.keys.normal.is_empty());
    }

    #[test]
    fn parses_sections_and_keys() {
        let tmp = write_config(
            "[editor]\nindent_unit = \"\\t\"\nline_numbers = \"rel\"\n\
             [runtime]\ntick_ms = 100\n\
             [keys.normal]\n\"ctrl+s\" = \"save\"\n[keys.insert]\n\"ctrl+c\" = \"enter_normal\"\n",
        );
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.editor.indent_unit, "\t");
        assert_eq!(cfg.file.editor.line_numbers, LineNumbers::Relative);
        assert_eq!(cfg.file.runtime.tick_ms, 100);
        assert_eq!(cfg.file.runtime.git_poll_secs, 2);
        assert_eq!(cfg.file.keys.normal.get("ctrl+s").map(String::as_str), Some("save"));
        assert_eq!(cfg.file.keys.insert.len(), 1);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = write_config("[editor\nindent_unit = 3");
        let err = load_from(Some(tmp.path().to_path_buf())).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config"));
    }

    #[test]
    fn margin_clamps_to_text_rows() {
        let tmp = write_config("[editor]\nscroll_margin = 50\n");
        let mut cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.apply_text_rows(20), 9);
        assert_eq!(cfg.apply_text_rows(3), 0);
        assert_eq!(cfg.apply_text_rows(200), 50);
    }

    #[test]
    fn clamp_logging_uses_config_target() {
        let tmp = write_config("[editor]\nscroll_margin = 8\n");
        let mut cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(BufferWriter {
                inner: buffer.clone(),
            })
            .finish();
        with_default(subscriber, || {
            cfg.apply_text_rows(6);
        });
        let out = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(out.contains("INFO config:"));
        assert!(out.contains("scroll_margin_clamped"));
        assert_eq!(cfg.effective_scroll_margin, 2);
    }

    #[test]
    fn line_number_modes_cycle() {
        assert_eq!(LineNumbers::parse("rel"), Some(LineNumbers::Relative));
        assert_eq!(LineNumbers::parse("x"), None);
        assert_eq!(LineNumbers::Relative.cycle(), LineNumbers::Off);
        assert_eq!(LineNumbers::Off.cycle().as_str(), "abs");
        assert_eq!(LineNumbers::Off.gutter_width(10), 0);
        assert_eq!(LineNumbers::Absolute.gutter_width(10), 4);
        assert_eq!(LineNumbers::Relative.gutter_width(12345), 6);
    }

    #[test]
    fn state_paths_layout() {
        let p = StatePaths::at(Path::new("/tmp/fe"));
        assert_eq!(p.changelog_dir(), Some(PathBuf::from("/tmp/fe/changelog")));
        assert_eq!(p.search_history(), Some(PathBuf::from("/tmp/fe/search_history")));
        assert!(StatePaths::disabled().command_history().is_none());
    }
}
