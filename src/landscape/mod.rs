//! Landscape recoloring: texture classification, tile grids, per-vertex
//! blending and per-tile orchestration.

pub mod classifier;
pub mod grid;
pub mod vertex;
pub mod patcher;

pub use classifier::{ResolvedTexture, SnowClassifier, TextureResolver};
pub use grid::{AlphaContribution, LandscapeGrid, Vertex};
pub use vertex::{FormulaKind, FormulaSets, SNOW_THRESHOLD};
pub use patcher::{patch_tile, remove_vertex_colors, TileOutcome, TileReport};
