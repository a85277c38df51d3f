//! Style presets: named bundles of markers and default hooks that a
//! project can select instead of spelling out every field.

use serde::{Deserialize, Serialize};

use super::config_data::HooksConfig;
use super::markers::Markers;

/// A named bundle of defaults applied before any other config field.
///
/// Distinct from [`crate::style::Style`], which detects the Markdown
/// *dialect* (Pandoc/Quarto/knitr fenced-attribute syntax) a document was
/// written in; `StylePreset` instead selects the marker/hook defaults for
/// a project as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StylePreset {
    /// `~/~ begin`/`~/~ end` markers, shebang + SPDX license hooks.
    #[default]
    Default,
    /// No markers, no hooks — closest to a naked tangle.
    Basic,
}

impl StylePreset {
    /// The marker set this preset resolves to.
    pub fn markers(&self) -> Markers {
        match self {
            StylePreset::Default => Markers::default(),
            StylePreset::Basic => Markers::default(),
        }
    }

    /// The hook set this preset resolves to.
    pub fn hooks(&self) -> HooksConfig {
        match self {
            StylePreset::Default => HooksConfig::default(),
            // `repl` is named here to match the documented BASIC hook set,
            // but has no corresponding `Hook` implementation: it names an
            // interactive-REPL integration, not a read/tangle transform,
            // so `Context::new` never registers anything for it.
            StylePreset::Basic => HooksConfig {
                names: vec![
                    "quarto_attributes".to_string(),
                    "shebang".to_string(),
                    "repl".to_string(),
                    "task".to_string(),
                    "spdx_license".to_string(),
                ],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preset() {
        assert_eq!(StylePreset::default(), StylePreset::Default);
    }

    #[test]
    fn test_basic_preset_enables_documented_hooks() {
        let hooks = StylePreset::Basic.hooks();
        assert!(hooks.contains("quarto_attributes"));
        assert!(hooks.contains("shebang"));
        assert!(hooks.contains("repl"));
        assert!(hooks.contains("task"));
        assert!(hooks.contains("spdx_license"));
    }

    #[test]
    fn test_default_preset_enables_standard_hooks() {
        let hooks = StylePreset::Default.hooks();
        assert!(hooks.contains("shebang"));
        assert!(hooks.contains("spdx_license"));
    }
}
