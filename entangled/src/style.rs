//! Code block syntax style definitions.
//!
//! Supports multiple code block syntax styles commonly used in literate programming:
//! - `entangled-rs`: Native style with `python #name file=path`
//! - `pandoc`: Original entangled style with `{.python #name file=path}`
//! - `quarto`: Quarto/Jupyter style with `{python}` and `#|` comments
//! - `knitr`: RMarkdown style with `{python, label=name, file=path}`

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Code block syntax style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Style {
    /// Native entangled-rs style: ```python #main file=out.py
    #[default]
    EntangledRs,
    /// Original Pandoc/entangled style: ``` {.python #main file=out.py}
    Pandoc,
    /// Quarto style: ```{python} with #| label: main inside block
    Quarto,
    /// RMarkdown/knitr style: ```{python, label=main, file=out.py}
    Knitr,
}

impl Style {
    /// Detect style from file extension.
    ///
    /// Returns `Some(style)` if the extension indicates a specific style,
    /// `None` if the extension doesn't indicate a specific style (e.g., `.md`).
    pub fn from_extension(path: &Path) -> Option<Style> {
        let ext = path.extension()?.to_str()?;
        match ext.to_lowercase().as_str() {
            "qmd" => Some(Style::Quarto),
            "rmd" => Some(Style::Knitr),
            // .md files don't indicate a specific style
            _ => None,
        }
    }

    /// Determine the style for a document.
    ///
    /// Priority:
    /// 1. File extension (`.qmd` -> Quarto, `.Rmd` -> Knitr)
    /// 2. Configured default style
    pub fn for_document(path: Option<&Path>, config_default: Style) -> Style {
        if let Some(path) = path {
            if let Some(style) = Self::from_extension(path) {
                return style;
            }
        }
        config_default
    }

    /// Returns the style name as a static string.
    pub fn name(&self) -> &'static str {
        match self {
            Style::EntangledRs => "entangled-rs",
            Style::Pandoc => "pandoc",
            Style::Quarto => "quarto",
            Style::Knitr => "knitr",
        }
    }
}

impl std::fmt::Display for Style {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "entangled-rs" | "entangledrs" | "entangled" => Ok(Style::EntangledRs),
            "pandoc" => Ok(Style::Pandoc),
            "quarto" => Ok(Style::Quarto),
            "knitr" | "rmarkdown" | "rmd" => Ok(Style::Knitr),
            _ => Err(format!(
                "Unknown style '{}'. Valid styles: entangled-rs, pandoc, quarto, knitr",
                s
            )),
        }
    }
}
