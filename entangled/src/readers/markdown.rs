//! Markdown parsing for code block extraction.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::errors::{EntangledError, Result};
use crate::hooks::HookRegistry;
use crate::model::{CodeBlock, Properties, ReferenceId, ReferenceMap, ReferenceName, extract_quarto_options};
use crate::style::Style;
use crate::text_location::TextLocation;

use super::delimiters::{extract_all_tokens, DelimitedToken, ExtractResult};
use super::yaml_header::split_yaml_header;

/// A parsed markdown document.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// The reference map containing all code blocks.
    pub refs: ReferenceMap,
    /// YAML frontmatter, if present.
    pub frontmatter: Option<String>,
    /// Source file path.
    pub source_path: Option<PathBuf>,
}

impl ParsedDocument {
    /// Creates a new empty parsed document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            refs: ReferenceMap::new(),
            frontmatter: None,
            source_path: None,
        }
    }

    /// Sets the source path.
    pub fn with_source_path(mut self, path: PathBuf) -> Self {
        self.source_path = Some(path);
        self
    }
}

impl Default for ParsedDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a markdown document and extracts code blocks, without running
/// any hooks. Most callers should use [`parse_markdown_with_hooks`]
/// instead; this is kept for tests and callers that have no `Context`.
pub fn parse_markdown(input: &str, source_path: Option<&Path>, config: &Config) -> Result<ParsedDocument> {
    parse_markdown_with_hooks(input, source_path, config, &HookRegistry::new())
}

/// Parses a markdown document and extracts code blocks, applying the
/// `on_read` hooks of `hooks` to each block before it is inserted into the
/// reference map.
pub fn parse_markdown_with_hooks(
    input: &str,
    source_path: Option<&Path>,
    config: &Config,
    hooks: &HookRegistry,
) -> Result<ParsedDocument> {
    let mut doc = ParsedDocument::new();

    if let Some(path) = source_path {
        doc.source_path = Some(path.to_path_buf());
    }

    // Determine document style based on file extension, with config default as fallback
    let doc_style = Style::for_document(source_path, config.style);

    // Extract YAML frontmatter
    let (yaml_header, content) = split_yaml_header(input);
    if let Some(header) = yaml_header {
        doc.frontmatter = Some(header.content);
    }

    // Blank out `~~~markdown ... ~~~`-delimited spans before fence
    // recognition runs, so any code fence they contain is treated as plain
    // prose rather than a real block. Blanking (rather than deleting) keeps
    // every later line number correct.
    let masked = mask_ignore_blocks(content, &config.ignore_begin, &config.ignore_end);

    // Parse code blocks
    let tokens = extract_all_tokens(&masked)?;

    for result in tokens {
        if let ExtractResult::Token(token) = result {
            if let Some(mut block) = process_code_block(&token, source_path, config, doc_style, hooks)? {
                hooks.run_on_read(&mut block)?;
                doc.refs.insert(block);
            }
        }
    }

    Ok(doc)
}

/// Masks `ignore_begin`..`ignore_end` spans by blanking every line they
/// contain (including the marker lines themselves), so the fence recognizer
/// never sees what is inside. Line numbers of everything after the span are
/// unaffected since the line count is preserved.
fn mask_ignore_blocks(input: &str, ignore_begin: &str, ignore_end: &str) -> String {
    if ignore_begin.is_empty() {
        return input.to_string();
    }

    let begin_marker = ignore_begin.trim();
    let end_marker = ignore_end.trim();
    let mut result: Vec<&str> = Vec::new();
    let mut in_ignore = false;

    for line in input.lines() {
        if in_ignore {
            result.push("");
            if line.trim() == end_marker {
                in_ignore = false;
            }
        } else if line.trim() == begin_marker {
            in_ignore = true;
            result.push("");
        } else {
            result.push(line);
        }
    }

    result.join("\n")
}

/// Processes a delimited token into a CodeBlock.
fn process_code_block(
    token: &DelimitedToken,
    source_path: Option<&Path>,
    config: &Config,
    doc_style: Style,
    hooks: &HookRegistry,
) -> Result<Option<CodeBlock>> {
    // Parse properties and content based on document style
    let (mut props, mut content) = parse_by_style(doc_style, &token.info, &token.content, config)?;

    // Get language from first class
    let language = props.first_class().map(|s| s.to_string());

    // A bare language-only fence (BASIC style) has no id/file in its info
    // string at all; if quarto_attributes is enabled, give it a chance to
    // contribute one from a leading `#|` header in the body before we give
    // up on the block as anonymous.
    if props.first_id().is_none()
        && props.file().is_none()
        && language.is_some()
        && hooks.contains("quarto_attributes")
    {
        let (extra, remaining, _header) = crate::hooks::extract_quarto_attributes_header(&content);
        if !extra.is_empty() {
            props.items.extend(extra);
            content = remaining;
        }
    }

    let id_str = props.first_id();
    let file_target = props.file();

    // Build location
    let location = if let Some(path) = source_path {
        TextLocation::file_line(path.to_path_buf(), token.location.line)
    } else {
        token.location.clone()
    };

    // The namespace this block's unqualified `#id` and `<<child>>`
    // references inherit: per §4.2, the file's POSIX path under
    // `NamespaceDefault::File` (the default), or none. This is the same
    // prefix used both to qualify the block's own name below and to carry
    // forward as `block.namespace`, so `<<name>>` expansions found in its
    // body resolve against the same namespace the block itself was named
    // under.
    let ns_prefix: Vec<String> = source_path
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .and_then(|n| config.namespace_default.prefix_for(n))
        .into_iter()
        .collect();

    // Determine the reference name - prioritize explicit ID over file target.
    // A block with neither still gets a synthetic `unnamed-<origin>` name so
    // it is never silently dropped from the reference map.
    let name = if let Some(id) = id_str {
        let parsed = ReferenceName::new(id);
        // An id already written with an explicit `::` namespace keeps it
        // as-is; only a bare id inherits the file-derived namespace.
        if parsed.is_unqualified() && !ns_prefix.is_empty() {
            ReferenceName::with_namespace(ns_prefix.clone(), parsed.base_name().to_string())
        } else {
            parsed
        }
    } else if let Some(file) = file_target {
        ReferenceName::from_file_path(file)
    } else {
        ReferenceName::new(format!("unnamed-{}", location))
    };

    let file = source_path.map(Path::to_path_buf).unwrap_or_default();

    // Create the code block
    let mut block = CodeBlock::new(
        ReferenceId::first(name, file),
        language,
        content,
        location,
    )
    .with_namespace(ns_prefix);

    // Set target if specified
    if let Some(file) = file_target {
        block.target = Some(PathBuf::from(file));
    }

    // Add additional classes
    for class in props.classes().into_iter().skip(1) {
        block = block.with_class(class.to_string());
    }

    // Add attributes
    for (key, value) in props.attributes() {
        if key == "file" {
            continue;
        }
        if key == "mode" {
            let mode = u32::from_str_radix(value, 8).map_err(|_| {
                EntangledError::CodeAttributeError {
                    location: block.origin.clone(),
                    message: format!("mode attribute `{}` is not a valid octal file permission", value),
                }
            })?;
            block = block.with_mode(mode);
        }
        block = block.with_attribute(key.to_string(), value.to_string());
    }

    Ok(Some(block))
}

/// Parse properties and content based on the detected style.
fn parse_by_style(
    style: Style,
    info: &str,
    content: &str,
    config: &Config,
) -> Result<(Properties, String)> {
    match style {
        Style::EntangledRs => {
            let props = Properties::parse(info)?;
            Ok((props, content.to_string()))
        }
        Style::Pandoc => {
            let props = Properties::parse_pandoc(info)?;
            Ok((props, content.to_string()))
        }
        Style::Knitr => {
            let props = Properties::parse_knitr(info)?;
            Ok((props, content.to_string()))
        }
        Style::Quarto => {
            // Extract language from info string
            let info_props = Properties::parse_quarto_info(info)?;
            let language = info_props.first_class();

            // Extract #| options from content
            let (quarto_opts, remaining_content) = extract_quarto_options(content);

            // Merge language with quarto options
            let props = quarto_opts.to_properties(language);

            // Determine final content based on strip_quarto_options setting
            let final_content = if config.strip_quarto_options {
                remaining_content
            } else {
                content.to_string()
            };

            Ok((props, final_content))
        }
    }
}

/// Reads a markdown file and parses it.
pub fn read_markdown_file(path: &Path, config: &Config) -> Result<ParsedDocument> {
    let content = std::fs::read_to_string(path)?;
    parse_markdown(&content, Some(path), config)
}
