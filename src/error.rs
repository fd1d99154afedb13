use thiserror::Error;

use crate::registry::{CellId, CellState, SignedSurf, SurfId};

/// Top-level error type for the halfspace engine.
#[derive(Debug, Error)]
pub enum HalfspaceError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Expression(#[from] ExpressionError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    #[error(transparent)]
    Deck(#[from] DeckError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl HalfspaceError {
    /// Returns `true` if the error leaves the model unsound to serialize.
    ///
    /// Fatal errors must terminate the whole build. Non-fatal errors are
    /// local to the component that triggered them.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Consistency(_))
    }
}

/// Errors related to surface parameters.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors raised while building a region expression.
#[derive(Debug, Error)]
pub enum ExpressionError {
    #[error("malformed expression `{expression}` at offset {position}: {reason}")]
    Malformed {
        expression: String,
        position: usize,
        reason: String,
    },

    #[error("degenerate region: {0}")]
    DegenerateRegion(String),
}

/// Errors raised by the surface and object registers.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("cell {0} is not registered")]
    UnknownCell(CellId),

    #[error("surface {0} is not registered")]
    UnknownSurface(SurfId),

    #[error("component `{0}` is not registered")]
    UnknownComponent(String),

    #[error("component `{0}` already owns a cell range")]
    DuplicateComponent(String),

    #[error("surface number {0} is already used by a different surface")]
    SurfaceNumberInUse(SurfId),

    #[error("renumbering is not a bijection: {0}")]
    NonBijective(String),

    #[error("cell {cell} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        cell: CellId,
        from: CellState,
        to: CellState,
    },

    #[error("cell {0} cannot be inserted into itself")]
    SelfInsertion(CellId),

    #[error("number space exhausted")]
    NumberSpaceExhausted,
}

/// A single leaf that points at a surface the register does not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DanglingReference {
    /// The cell whose region holds the leaf.
    pub cell: CellId,
    /// The unresolved surface reference.
    pub surface: SignedSurf,
}

/// Errors raised by the global consistency passes.
///
/// All of these abort the current build.
#[derive(Debug, Error)]
pub enum ConsistencyError {
    #[error("circular complement: {}", format_chain(.chain))]
    CircularComplement { chain: Vec<CellId> },

    #[error("dangling surface reference(s): {}", format_dangling(.references))]
    DanglingSurfaceReference { references: Vec<DanglingReference> },

    #[error("surface {surface} cannot be removed: still referenced by cell {cell}")]
    SurfaceStillReferenced { surface: SurfId, cell: CellId },

    #[error("cell {cell} still holds an unresolved complement of cell {target}")]
    UnresolvedComplement { cell: CellId, target: CellId },
}

/// Errors raised while reading a deck back.
#[derive(Debug, Error)]
pub enum DeckError {
    #[error("line {line}: {reason}")]
    MalformedCard { line: usize, reason: String },

    #[error("failed to write deck: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

fn format_chain(chain: &[CellId]) -> String {
    chain
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn format_dangling(references: &[DanglingReference]) -> String {
    references
        .iter()
        .map(|r| format!("cell {} -> {}", r.cell, r.surface))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience type alias for results using [`HalfspaceError`].
pub type Result<T> = std::result::Result<T, HalfspaceError>;
