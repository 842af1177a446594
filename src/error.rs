use thiserror::Error;

/// Top-level error type for the floorplan compiler.
#[derive(Debug, Error)]
pub enum FloorplanError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    Tessellation(#[from] TessellationError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("non-finite coordinate ({x}, {y})")]
    NonFinite { x: f64, y: f64 },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),
}

/// Errors related to the planar subdivision.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("faces are outdated, rebuild the arrangement faces first")]
    FacesOutdated,

    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

/// Integrity violations raised while compiling a floorplan.
///
/// All of them abort the compilation; there is no partial output.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Failed to construct connection: {0}")]
    ConnectionFailed(String),

    #[error("Doorstep lost: {0}")]
    DoorstepLost(String),

    #[error("Door step error: {0}")]
    DoorStep(String),

    #[error("Failed to make progress: {0}")]
    NoProgress(String),

    #[error("Overlapping polygons: {0}")]
    OverlappingPolygons(String),

    #[error("invalid site: {0}")]
    InvalidSite(String),
}

/// Errors raised while reading the persisted text form.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("unexpected end of input while reading {0}")]
    UnexpectedEof(&'static str),

    #[error("invalid token {token:?} while reading {expected}")]
    InvalidToken {
        token: String,
        expected: &'static str,
    },

    #[error("trailing data after floorplan: {0:?}")]
    TrailingData(String),
}

/// Errors related to tessellation.
#[derive(Debug, Error)]
pub enum TessellationError {
    #[error("invalid tessellation input: {0}")]
    InvalidInput(String),

    #[error("tessellation failed: {0}")]
    Failed(String),
}

/// Convenience type alias for results using [`FloorplanError`].
pub type Result<T> = std::result::Result<T, FloorplanError>;
