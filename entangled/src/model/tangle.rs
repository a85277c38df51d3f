//! Tangle algorithm for expanding code block references into source files.
//!
//! Implements the recursive expansion described for the tangler: each
//! named block is read in document order, `<<name>>` placeholders are
//! replaced by the (possibly further-nested) expansion of the reference
//! they name, and annotation comments are wrapped around each expanded
//! occurrence so the origin can be recovered when stitching back.

use std::collections::HashSet;

use crate::config::{annotation_begin, annotation_end, Comment, Markers, REF_PATTERN};
use crate::errors::{EntangledError, Result};

use super::reference_map::ReferenceMap;
use super::reference_name::ReferenceName;

/// Cycle detector for preventing infinite loops during tangling.
#[derive(Debug, Clone, Default)]
pub struct CycleDetector {
    /// Stack of reference names currently being expanded (for error reporting).
    stack: Vec<ReferenceName>,
    /// Set for O(1) membership checks.
    seen: HashSet<ReferenceName>,
}

impl CycleDetector {
    /// Creates a new cycle detector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters a reference, checking for cycles.
    ///
    /// Returns an error if entering this reference would create a cycle.
    pub fn enter(&mut self, name: &ReferenceName) -> Result<()> {
        if self.seen.contains(name) {
            let mut cycle = self.stack.clone();
            cycle.push(name.clone());
            return Err(EntangledError::CycleDetected(cycle));
        }
        self.seen.insert(name.clone());
        self.stack.push(name.clone());
        Ok(())
    }

    /// Exits a reference.
    pub fn exit(&mut self) {
        if let Some(name) = self.stack.pop() {
            self.seen.remove(&name);
        }
    }

    /// Returns the current depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

/// Resolves a `<<name>>` capture against the namespace of the block it was
/// found in — unqualified child references inherit the enclosing block's
/// namespace, explicit `ns::name` references are left alone.
fn resolve_child(refname: &str, enclosing_namespace: &[String]) -> ReferenceName {
    ReferenceName::new(refname).resolve_in(enclosing_namespace)
}

/// Tangles a reference without annotations (naked output).
///
/// Expands all `<<refname>>` patterns recursively.
pub fn tangle_naked(
    refs: &ReferenceMap,
    name: &ReferenceName,
    base_indent: &str,
    detector: &mut CycleDetector,
) -> Result<String> {
    detector.enter(name)?;

    let ids = refs.get_ids_by_name(name);
    if ids.is_empty() {
        detector.exit();
        return Err(EntangledError::ReferenceNotFound(name.clone()));
    }

    let mut output = Vec::new();

    for id in ids {
        let block = refs.get(id).ok_or_else(|| {
            EntangledError::Internal(format!(
                "reference map has id {} in name index but not in block storage",
                id
            ))
        })?;

        if let Some(header) = &block.header {
            output.push(format!("{}{}", base_indent, header));
        }

        for line in block.source.lines() {
            if let Some(caps) = REF_PATTERN.captures(line) {
                let indent = &caps["indent"];
                let refname = &caps["refname"];
                let combined_indent = format!("{}{}", base_indent, indent);

                let ref_name = resolve_child(refname, &block.namespace);
                let expanded = tangle_naked(refs, &ref_name, &combined_indent, detector)?;
                output.push(expanded);
            } else if line.is_empty() {
                output.push(String::new());
            } else {
                output.push(format!("{}{}", base_indent, line));
            }
        }
    }

    detector.exit();
    Ok(output.join("\n"))
}

/// Tangles a reference with annotation comments.
///
/// Adds begin/end markers around each expanded reference, plus a leading
/// header line (shebang, SPDX identifier, ...) left outside the wrapper by
/// a hook. Requires every block reached to carry a language, since the
/// comment syntax used for the markers is selected per output file from
/// that language.
pub fn tangle_annotated(
    refs: &ReferenceMap,
    name: &ReferenceName,
    base_indent: &str,
    comment: &Comment,
    markers: &Markers,
    file_posix: &str,
    detector: &mut CycleDetector,
) -> Result<String> {
    detector.enter(name)?;

    let ids = refs.get_ids_by_name(name);
    if ids.is_empty() {
        detector.exit();
        return Err(EntangledError::ReferenceNotFound(name.clone()));
    }

    let mut output = Vec::new();
    let prefix = comment.prefix();

    for id in ids {
        let block = refs.get(id).ok_or_else(|| {
            EntangledError::Internal(format!(
                "reference map has id {} in name index but not in block storage",
                id
            ))
        })?;

        if block.language.is_none() {
            detector.exit();
            return Err(EntangledError::MissingLanguageError(block.origin.clone()));
        }

        if let Some(header) = &block.header {
            output.push(format!("{}{}", base_indent, header));
        }

        let begin_marker = format!(
            "{}{}",
            base_indent,
            annotation_begin(prefix, markers, &id.marker(file_posix))
        );
        output.push(begin_marker);

        for line in block.source.lines() {
            if let Some(caps) = REF_PATTERN.captures(line) {
                let indent = &caps["indent"];
                let refname = &caps["refname"];
                let combined_indent = format!("{}{}", base_indent, indent);

                let ref_name = resolve_child(refname, &block.namespace);
                let expanded = tangle_annotated(
                    refs,
                    &ref_name,
                    &combined_indent,
                    comment,
                    markers,
                    file_posix,
                    detector,
                )?;
                output.push(expanded);
            } else if line.is_empty() {
                output.push(String::new());
            } else {
                output.push(format!("{}{}", base_indent, line));
            }
        }

        let end_marker = format!("{}{}", base_indent, annotation_end(prefix, markers));
        output.push(end_marker);
    }

    detector.exit();
    Ok(output.join("\n"))
}

/// Tangles a reference with blank-line separators between blocks (bare output).
///
/// Like `tangle_annotated` but emits blank lines instead of marker comments,
/// then collapses consecutive blank lines and trims leading/trailing blanks.
pub fn tangle_bare(
    refs: &ReferenceMap,
    name: &ReferenceName,
    base_indent: &str,
    detector: &mut CycleDetector,
) -> Result<String> {
    detector.enter(name)?;

    let ids = refs.get_ids_by_name(name);
    if ids.is_empty() {
        detector.exit();
        return Err(EntangledError::ReferenceNotFound(name.clone()));
    }

    let mut output = Vec::new();

    for id in ids {
        let block = refs.get(id).ok_or_else(|| {
            EntangledError::Internal(format!(
                "reference map has id {} in name index but not in block storage",
                id
            ))
        })?;

        output.push(String::new());

        if let Some(header) = &block.header {
            output.push(format!("{}{}", base_indent, header));
        }

        for line in block.source.lines() {
            if let Some(caps) = REF_PATTERN.captures(line) {
                let indent = &caps["indent"];
                let refname = &caps["refname"];
                let combined_indent = format!("{}{}", base_indent, indent);

                let ref_name = resolve_child(refname, &block.namespace);
                let expanded = tangle_bare(refs, &ref_name, &combined_indent, detector)?;
                output.push(expanded);
            } else if line.is_empty() {
                output.push(String::new());
            } else {
                output.push(format!("{}{}", base_indent, line));
            }
        }

        output.push(String::new());
    }

    detector.exit();
    let joined = output.join("\n");
    Ok(collapse_blank_lines(&joined))
}

/// Collapses runs of 2+ consecutive blank lines into a single blank line,
/// and trims leading/trailing blank lines.
fn collapse_blank_lines(s: &str) -> String {
    let mut result = Vec::new();
    let mut prev_blank = false;

    for line in s.lines() {
        let is_blank = line.trim().is_empty();
        if is_blank {
            if !prev_blank {
                result.push("");
            }
            prev_blank = true;
        } else {
            result.push(line);
            prev_blank = false;
        }
    }

    while result.first() == Some(&"") {
        result.remove(0);
    }
    while result.last() == Some(&"") {
        result.pop();
    }

    result.join("\n")
}

/// Tangles a single reference (entry point).
///
/// This is a convenience function that creates a cycle detector and tangles
/// with or without annotations based on the `annotated` parameter.
///
/// Dispatch:
/// - `(Some(comment), Some(markers))` → annotated output (`file_posix` is
///   the forward-slash path of the Markdown file, used in markers)
/// - `(None, Some(markers))` → bare output (blank-line separators)
/// - `_` → naked output
pub fn tangle_ref(
    refs: &ReferenceMap,
    name: &ReferenceName,
    comment: Option<&Comment>,
    markers: Option<&Markers>,
    file_posix: &str,
) -> Result<String> {
    let mut detector = CycleDetector::new();

    match (comment, markers) {
        (Some(c), Some(m)) => tangle_annotated(refs, name, "", c, m, file_posix, &mut detector),
        (None, Some(_)) => tangle_bare(refs, name, "", &mut detector),
        _ => tangle_naked(refs, name, "", &mut detector),
    }
}
