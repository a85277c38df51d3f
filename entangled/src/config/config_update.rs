//! Configuration update and merging.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::annotation_method::AnnotationMethod;
use super::config_data::{Config, HooksConfig, WatchConfig};
use super::language::Language;
use super::markers::Markers;
use super::namespace_default::NamespaceDefault;
use super::style_preset::StylePreset;
use crate::style::Style;

/// Partial configuration update that can be merged into a Config.
///
/// All fields are optional. Only specified fields will override the base config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigUpdate {
    /// Version of the configuration format.
    #[serde(default)]
    pub version: Option<String>,

    /// Named bundle of marker/hook defaults, resolved before any other
    /// field in this update is applied.
    #[serde(default)]
    pub style_preset: Option<StylePreset>,

    /// Glob patterns for markdown source files.
    #[serde(default)]
    pub source_patterns: Option<Vec<String>>,

    /// Directory for generated/tangled files.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// How to annotate tangled output.
    #[serde(default)]
    pub annotation: Option<AnnotationMethod>,

    /// Default namespace handling.
    #[serde(default)]
    pub namespace_default: Option<NamespaceDefault>,

    /// Marker patterns for annotations.
    #[serde(default)]
    pub markers: Option<Markers>,

    /// Language configurations.
    #[serde(default)]
    pub languages: Option<Vec<Language>>,

    /// Watch configuration.
    #[serde(default)]
    pub watch: Option<WatchConfig>,

    /// Hook configurations.
    #[serde(default)]
    pub hooks: Option<HooksConfig>,

    /// File database path.
    #[serde(default)]
    pub filedb_path: Option<PathBuf>,

    /// Code block syntax style.
    #[serde(default)]
    pub style: Option<Style>,

    /// Whether to strip #| comment lines from tangled output.
    #[serde(default)]
    pub strip_quarto_options: Option<bool>,

    /// Marker line that opens an ignored (plain-text) span.
    #[serde(default)]
    pub ignore_begin: Option<String>,

    /// Marker line that closes an ignored span.
    #[serde(default)]
    pub ignore_end: Option<String>,
}

impl ConfigUpdate {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges this update into a base configuration, returning a new Config.
    ///
    /// The style preset, if given, is resolved first so its markers/hooks
    /// become the new base that the rest of this update's fields (and any
    /// explicit `markers`/`hooks` it also carries) are layered on top of.
    /// `version` takes the higher of the two parsed `major.minor` values
    /// rather than simply preferring the update, so merging an older
    /// config file into a newer default never downgrades it.
    ///
    /// Consumes `self` so fields can be moved instead of cloned.
    pub fn merge_into(self, base: &Config) -> Config {
        let (preset_markers, preset_hooks) = match self.style_preset {
            Some(preset) => (preset.markers(), preset.hooks()),
            None => (base.markers.clone(), base.hooks.clone()),
        };

        Config {
            version: merge_version(&base.version, self.version.as_deref()),
            style_preset: self.style_preset.unwrap_or(base.style_preset),
            source_patterns: self
                .source_patterns
                .unwrap_or_else(|| base.source_patterns.clone()),
            output_dir: self.output_dir.or_else(|| base.output_dir.clone()),
            annotation: self.annotation.unwrap_or(base.annotation),
            namespace_default: self.namespace_default.unwrap_or(base.namespace_default),
            markers: self.markers.unwrap_or(preset_markers),
            languages: merge_languages(
                &base.languages,
                self.languages.as_ref().unwrap_or(&Vec::new()),
            ),
            watch: self.watch.unwrap_or_else(|| base.watch.clone()),
            hooks: merge_hooks(&preset_hooks, self.hooks.as_ref()),
            filedb_path: self
                .filedb_path
                .unwrap_or_else(|| base.filedb_path.clone()),
            style: self.style.unwrap_or(base.style),
            strip_quarto_options: self.strip_quarto_options.unwrap_or(base.strip_quarto_options),
            ignore_begin: self.ignore_begin.unwrap_or_else(|| base.ignore_begin.clone()),
            ignore_end: self.ignore_end.unwrap_or_else(|| base.ignore_end.clone()),
            extra: base.extra.clone(),
        }
    }
}

/// Picks the higher of two `major.minor` version strings.
///
/// Falls back to `update` verbatim if either string fails to parse as
/// numeric dotted components — malformed versions are a config validation
/// concern, not something this merge step should silently mask.
fn merge_version(base: &str, update: Option<&str>) -> String {
    let Some(update) = update else {
        return base.to_string();
    };

    match (parse_version(base), parse_version(update)) {
        (Some(b), Some(u)) if b >= u => base.to_string(),
        _ => update.to_string(),
    }
}

fn parse_version(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().unwrap_or("0").parse().ok()?;
    Some((major, minor))
}

/// Merge language lists, with update languages overriding base languages of the same name.
fn merge_languages(base: &[Language], update: &[Language]) -> Vec<Language> {
    let mut result = base.to_vec();

    for lang in update {
        // Remove any existing language with the same name
        result.retain(|l| l.name != lang.name);
        result.push(lang.clone());
    }

    result
}

/// Merges hook name lists.
///
/// Each entry in `update` is either a bare hook name (added to the set) or
/// a `~`-prefixed name (removed from the set, regardless of whether the
/// base config or an earlier style preset enabled it).
fn merge_hooks(base: &HooksConfig, update: Option<&HooksConfig>) -> HooksConfig {
    let Some(update) = update else {
        return base.clone();
    };

    let mut names = base.names.clone();
    for entry in &update.names {
        if let Some(removed) = entry.strip_prefix('~') {
            names.retain(|n| n != removed);
        } else if !names.iter().any(|n| n == entry) {
            names.push(entry.clone());
        }
    }

    HooksConfig { names }
}

impl From<ConfigUpdate> for Config {
    fn from(update: ConfigUpdate) -> Self {
        update.merge_into(&Config::default())
    }
}
