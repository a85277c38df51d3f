//! Configuration data structures.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::annotation_method::AnnotationMethod;
use super::language::Language;
use super::markers::Markers;
use super::namespace_default::NamespaceDefault;
use super::style_preset::StylePreset;
use crate::style::Style;

/// Main configuration structure for Entangled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Version of the configuration format.
    #[serde(default = "default_version")]
    pub version: String,

    /// Named bundle of marker/hook defaults resolved before other fields.
    #[serde(default)]
    pub style_preset: StylePreset,

    /// Glob patterns for markdown source files.
    #[serde(default = "default_source_patterns")]
    pub source_patterns: Vec<String>,

    /// Directory for generated/tangled files.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// How to annotate tangled output.
    #[serde(default)]
    pub annotation: AnnotationMethod,

    /// Default namespace handling.
    #[serde(default)]
    pub namespace_default: NamespaceDefault,

    /// Marker patterns for annotations.
    #[serde(default)]
    pub markers: Markers,

    /// Language configurations (overrides built-ins).
    #[serde(default)]
    pub languages: Vec<Language>,

    /// Watch configuration.
    #[serde(default)]
    pub watch: WatchConfig,

    /// Hook configurations.
    #[serde(default)]
    pub hooks: HooksConfig,

    /// File database path.
    #[serde(default = "default_filedb_path")]
    pub filedb_path: PathBuf,

    /// Code block syntax style.
    #[serde(default)]
    pub style: Style,

    /// Whether to strip #| comment lines from tangled output (Quarto style).
    #[serde(default = "default_strip_quarto_options")]
    pub strip_quarto_options: bool,

    /// Marker line that opens a span of Markdown treated as plain text, even
    /// if it contains lines that would otherwise look like code fences.
    #[serde(default = "default_ignore_begin")]
    pub ignore_begin: String,

    /// Marker line that closes an ignore span opened by `ignore_begin`.
    #[serde(default = "default_ignore_end")]
    pub ignore_end: String,

    /// Additional custom settings.
    #[serde(default, flatten)]
    pub extra: HashMap<String, toml::Value>,
}

fn default_version() -> String {
    "2.0".to_string()
}

fn default_source_patterns() -> Vec<String> {
    vec![
        "**/*.md".to_string(),
        "**/*.qmd".to_string(),
        "**/*.Rmd".to_string(),
    ]
}

fn default_filedb_path() -> PathBuf {
    PathBuf::from(".entangled/filedb.json")
}

fn default_strip_quarto_options() -> bool {
    true
}

fn default_ignore_begin() -> String {
    "~~~markdown".to_string()
}

fn default_ignore_end() -> String {
    "~~~".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            style_preset: StylePreset::default(),
            source_patterns: default_source_patterns(),
            output_dir: None,
            annotation: AnnotationMethod::default(),
            namespace_default: NamespaceDefault::default(),
            markers: Markers::default(),
            languages: Vec::new(),
            watch: WatchConfig::default(),
            hooks: HooksConfig::default(),
            filedb_path: default_filedb_path(),
            style: Style::default(),
            strip_quarto_options: default_strip_quarto_options(),
            ignore_begin: default_ignore_begin(),
            ignore_end: default_ignore_end(),
            extra: HashMap::new(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a language by identifier, checking custom languages first.
    pub fn find_language(&self, identifier: &str) -> Option<Language> {
        // Check custom languages first
        if let Some(lang) = self.languages.iter().find(|l| l.matches(identifier)) {
            return Some(lang.clone());
        }
        // Fall back to built-in languages
        super::templates::find_language(identifier)
    }

    /// Returns all source patterns.
    pub fn source_patterns(&self) -> &[String] {
        &self.source_patterns
    }

    /// Returns the output directory, if configured.
    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }
}

/// Watch mode configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Debounce delay in milliseconds.
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,

    /// Additional directories to watch.
    #[serde(default)]
    pub include: Vec<String>,

    /// Patterns to exclude from watching.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_debounce() -> u64 {
    100
}

/// Hook configuration: the set of hook names active for this project.
///
/// Stored as a plain list rather than one boolean per hook so a project
/// config can enable a hook by naming it and disable one inherited from
/// the style preset by naming it with a `~` prefix (see `ConfigUpdate`'s
/// merge logic). Recognized names: `shebang`, `spdx_license`,
/// `quarto_attributes`, `task`, `build`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HooksConfig {
    pub names: Vec<String>,
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            names: vec!["shebang".to_string(), "spdx_license".to_string()],
        }
    }
}

impl HooksConfig {
    /// Returns true if the named hook is enabled.
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}
