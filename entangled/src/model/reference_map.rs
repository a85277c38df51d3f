//! Reference map with dual-index for code block lookup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;

use super::code_block::CodeBlock;
use super::reference_id::ReferenceId;
use super::reference_name::ReferenceName;
use crate::errors::{EntangledError, Result};

/// A map of code blocks with dual-index lookup, matching the three
/// indices of the reference model: `map` (primary), `by_name` (ordered
/// per-name occurrences), `targets` (output path -> name).
///
/// Blocks are stored behind `Arc` to allow cheap cloning when combining
/// reference maps from multiple documents during tangle.
#[derive(Debug, Clone, Default)]
pub struct ReferenceMap {
    /// Primary storage: ID -> CodeBlock (insertion order preserved).
    blocks: IndexMap<ReferenceId, Arc<CodeBlock>>,

    /// Name index: Name -> ordered list of IDs with that name.
    by_name: HashMap<ReferenceName, Vec<ReferenceId>>,

    /// Target file registry: Path -> Reference name.
    targets: HashMap<PathBuf, ReferenceName>,

    /// Per-(name, file) ordinal counter, so `ord` enumerates `0..k-1`
    /// with no gaps for a given name within a given file.
    counters: HashMap<(ReferenceName, PathBuf), usize>,
}

impl ReferenceMap {
    /// Creates a new empty reference map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a code block, assigning the next ordinal for its
    /// `(name, file)` pair. `block.id.file` must already be set to the
    /// originating Markdown path; `block.id.ord` is overwritten.
    ///
    /// Returns the assigned ReferenceId.
    pub fn insert(&mut self, mut block: CodeBlock) -> ReferenceId {
        let key = (block.name().clone(), block.id.file.clone());
        let ord = self.counters.entry(key.clone()).or_insert(0);
        let id = ReferenceId::new(block.name().clone(), key.1, *ord);
        *ord += 1;

        block.id = id.clone();

        if let Some(ref target) = block.target {
            self.targets.insert(target.clone(), block.name().clone());
        }

        self.by_name
            .entry(block.name().clone())
            .or_default()
            .push(id.clone());

        self.blocks.insert(id.clone(), Arc::new(block));

        id
    }

    /// Inserts a code block with a specific ID (for stitching/merging).
    pub fn insert_with_id(&mut self, id: ReferenceId, block: CodeBlock) {
        self.insert_arc_with_id(id, Arc::new(block));
    }

    /// Inserts an `Arc<CodeBlock>` with a specific ID.
    ///
    /// This avoids deep-cloning when transferring blocks between maps.
    pub fn insert_arc_with_id(&mut self, id: ReferenceId, block: Arc<CodeBlock>) {
        let key = (id.name.clone(), id.file.clone());
        let counter = self.counters.entry(key).or_insert(0);
        if id.ord >= *counter {
            *counter = id.ord + 1;
        }

        if let Some(ref target) = block.target {
            self.targets.insert(target.clone(), id.name.clone());
        }

        self.by_name.entry(id.name.clone()).or_default().push(id.clone());

        self.blocks.insert(id, block);
    }

    /// Gets a code block by its ID.
    pub fn get(&self, id: &ReferenceId) -> Option<&CodeBlock> {
        self.blocks.get(id).map(|arc| arc.as_ref())
    }

    /// Gets all code blocks with the given name, in document order.
    pub fn get_by_name(&self, name: &ReferenceName) -> Vec<&CodeBlock> {
        self.by_name
            .get(name)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.blocks.get(id))
                    .map(|arc| arc.as_ref())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Gets all IDs for blocks with the given name, in document order.
    pub fn get_ids_by_name(&self, name: &ReferenceName) -> Vec<&ReferenceId> {
        self.by_name.get(name).map(|ids| ids.iter().collect()).unwrap_or_default()
    }

    /// Gets the reference name for a target file.
    pub fn get_target_name(&self, path: &Path) -> Option<&ReferenceName> {
        self.targets.get(path)
    }

    /// Checks if a name exists in the map.
    pub fn contains_name(&self, name: &ReferenceName) -> bool {
        self.by_name.contains_key(name)
    }

    /// Checks if an ID exists in the map.
    pub fn contains_id(&self, id: &ReferenceId) -> bool {
        self.blocks.contains_key(id)
    }

    /// Returns all registered target files.
    pub fn targets(&self) -> impl Iterator<Item = &PathBuf> {
        self.targets.keys()
    }

    /// Returns all reference names.
    pub fn names(&self) -> impl Iterator<Item = &ReferenceName> {
        self.by_name.keys()
    }

    /// Returns all code blocks in insertion order.
    pub fn blocks(&self) -> impl Iterator<Item = &CodeBlock> {
        self.blocks.values().map(|arc| arc.as_ref())
    }

    /// Returns all (ID, CodeBlock) pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ReferenceId, &CodeBlock)> {
        self.blocks.iter().map(|(id, arc)| (id, arc.as_ref()))
    }

    /// Returns all (ID, Arc<CodeBlock>) pairs in insertion order.
    ///
    /// Use this when transferring blocks between maps to avoid deep cloning.
    pub fn iter_arcs(&self) -> impl Iterator<Item = (&ReferenceId, &Arc<CodeBlock>)> {
        self.blocks.iter()
    }

    /// Returns the number of code blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns true if there are no code blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Concatenates all source code for blocks with the given name, in
    /// document order, joined by newlines.
    pub fn concatenate_source(&self, name: &ReferenceName) -> Result<String> {
        let blocks = self.get_by_name(name);
        if blocks.is_empty() {
            return Err(EntangledError::ReferenceNotFound(name.clone()));
        }

        Ok(blocks
            .iter()
            .map(|b| b.source.as_str())
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Returns the number of blocks with the given name.
    pub fn count_by_name(&self, name: &ReferenceName) -> usize {
        self.by_name.get(name).map(|v| v.len()).unwrap_or(0)
    }

    /// Mutates the block at `id` in place via Arc's `make_mut`, cloning
    /// only if another reference map shares the block.
    ///
    /// Used by the CodeReader to write back edited sources during stitch.
    pub fn with_block_mut<F: FnOnce(&mut CodeBlock)>(&mut self, id: &ReferenceId, f: F) -> bool {
        match self.blocks.get_mut(id) {
            Some(arc) => {
                f(Arc::make_mut(arc));
                true
            }
            None => false,
        }
    }
}
