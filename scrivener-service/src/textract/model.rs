//! Block graph model for one extraction job's result set.
//!
//! Textract returns a flat, id-indexed list of layout elements ("blocks")
//! that reference each other by id. The `Vec<Block>` fetched for a job is
//! the owning collection; [`BlockMap`] is a derived, non-owning lookup built
//! once per reconstruction and discarded afterwards.

use std::collections::HashMap;

/// The block types the pipeline consumes.
///
/// `Other` absorbs everything else the provider emits (every job carries
/// `PAGE` blocks, analysis jobs can carry `MERGED_CELL` and friends) so that
/// conversion from the SDK is total. Reconstructors skip unknown kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Line,
    Word,
    SelectionElement,
    KeyValueSet,
    Table,
    Cell,
    Other(String),
}

/// Selection state of a `SELECTION_ELEMENT` block (checkboxes, radio marks).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStatus {
    Selected,
    NotSelected,
}

/// Which side of a key/value pair a `KEY_VALUE_SET` block represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Key,
    Value,
}

/// Edge label on a relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationshipKind {
    Child,
    Value,
    Other(String),
}

/// A directed, ordered edge set from one block into others, by id.
///
/// Relationships do not own their targets; ids resolve through the job's
/// [`BlockMap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub kind: RelationshipKind,
    pub ids: Vec<String>,
}

/// One detected layout element from an extraction job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Opaque id, unique within one job's result set.
    pub id: String,
    pub kind: BlockKind,
    /// Recognized text; present for `LINE` and `WORD` blocks.
    pub text: Option<String>,
    /// Present only for `SELECTION_ELEMENT` blocks.
    pub selection_status: Option<SelectionStatus>,
    /// Present only for `KEY_VALUE_SET` blocks; contains `Key` on the key
    /// side, `Value` (or nothing) on the value side.
    pub entity_types: Vec<EntityType>,
    /// 1-based table coordinates; present only for `CELL` blocks.
    pub row_index: Option<u32>,
    pub column_index: Option<u32>,
    pub relationships: Vec<Relationship>,
}

impl Block {
    /// Minimal block of the given kind; fields default to empty/absent.
    pub fn new(id: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            kind,
            text: None,
            selection_status: None,
            entity_types: Vec::new(),
            row_index: None,
            column_index: None,
            relationships: Vec::new(),
        }
    }

    /// Whether this is the key side of a key/value pair.
    pub fn is_key(&self) -> bool {
        self.kind == BlockKind::KeyValueSet && self.entity_types.contains(&EntityType::Key)
    }

    /// Relationships of the given kind, in declaration order.
    pub fn relationships_of(
        &self,
        kind: RelationshipKind,
    ) -> impl Iterator<Item = &Relationship> {
        self.relationships.iter().filter(move |r| r.kind == kind)
    }
}

/// Id lookup into one job's block arena.
pub struct BlockMap<'a> {
    by_id: HashMap<&'a str, &'a Block>,
}

impl<'a> BlockMap<'a> {
    /// Index the arena by id. Later duplicates win, though ids are unique
    /// within a well-formed result set.
    pub fn new(blocks: &'a [Block]) -> Self {
        let by_id = blocks.iter().map(|b| (b.id.as_str(), b)).collect();
        Self { by_id }
    }

    /// Resolve an id. `None` only when a result set is internally
    /// inconsistent; callers skip unresolved references rather than fail.
    pub fn get(&self, id: &str) -> Option<&'a Block> {
        self.by_id.get(id).copied()
    }
}
