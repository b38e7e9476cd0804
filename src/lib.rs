//! Landscape vertex color recoloring
//!
//! Rewrites the baked vertex colors of every landscape tile in a world with
//! user formulas, picking a snow or standard formula set per vertex from the
//! textures painted there. Changed tiles are written to a separate patch.

pub mod codec;
pub mod error;
pub mod landscape;
pub mod plugin;
pub mod settings;
pub mod runner;
pub use recolor_formula as formula;

pub use error::{Error, Result};
pub use codec::{
    FormId, VertexColor, Quadrant, LandscapeFlags, TextureFlags,
    VertexColors, LayerHeader, AlphaEntry, TextureLayer,
};
pub use landscape::{
    SnowClassifier, TextureResolver, ResolvedTexture,
    LandscapeGrid, Vertex, FormulaKind, FormulaSets, SNOW_THRESHOLD,
    TileOutcome, TileReport,
};
pub use plugin::{Plugin, LandscapeRecord, LandscapeTexture, RawLayer, OverrideStore, PatchMod};
pub use settings::Settings;
pub use runner::{run_patch, RunOptions, RunSummary};
