pub mod config;
pub mod consistency;
pub mod deck;
pub mod error;
pub mod geometry;
pub mod math;
pub mod model;
pub mod registry;
pub mod rule;

pub use config::EngineConfig;
pub use error::{HalfspaceError, Result};
pub use model::Model;
pub use registry::{CellData, CellId, CellState, SignedSurf, SurfId};
pub use rule::{HeadRule, Rule};
