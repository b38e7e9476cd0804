//! Per-tile orchestration: decode, recolor every vertex, write back on change

use tracing::{debug, trace};

use super::classifier::SnowClassifier;
use super::grid::LandscapeGrid;
use super::vertex::FormulaSets;
use crate::codec::{LandscapeFlags, GRID_SIZE};
use crate::error::Result;
use crate::plugin::{LandscapeRecord, OverrideStore};

/// What happened to one landscape tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileOutcome {
    /// An override with new vertex colors was written
    Patched,
    /// Every vertex kept its color
    Unchanged,
    /// No vertex colors to recolor
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileReport {
    pub outcome: TileOutcome,
    pub discarded_alpha_entries: usize,
}

impl TileReport {
    fn new(outcome: TileOutcome) -> Self {
        Self { outcome, discarded_alpha_entries: 0 }
    }
}

/// Recolor one tile.
///
/// All subrecords are decoded before anything is written, so a malformed tile
/// never produces an override. Tiles whose colors do not change are not
/// written either.
pub fn patch_tile(
    record: &LandscapeRecord,
    classifier: &SnowClassifier<'_>,
    formulas: &FormulaSets,
    store: &dyn OverrideStore,
) -> Result<TileReport> {
    let Some(colors) = record.read_vertex_colors()? else {
        trace!("landscape {}: no vertex colors", record.describe());
        return Ok(TileReport::new(TileOutcome::Skipped));
    };
    let layers = record.read_layers()?;

    let mut grid = LandscapeGrid::build(&layers, colors);
    let mut changed = false;
    for y in 0..GRID_SIZE {
        for x in 0..GRID_SIZE {
            changed |= grid.blend_vertex(x, y, classifier, formulas);
        }
    }

    let discarded_alpha_entries = grid.discarded_alpha_entries();
    if !changed {
        return Ok(TileReport { outcome: TileOutcome::Unchanged, discarded_alpha_entries });
    }

    store.get_or_add_override(record, &mut |o| o.write_vertex_colors(grid.colors()));
    debug!("landscape {}: vertex colors rewritten", record.describe());
    Ok(TileReport { outcome: TileOutcome::Patched, discarded_alpha_entries })
}

/// Strip vertex colors from one tile
pub fn remove_vertex_colors(record: &LandscapeRecord, store: &dyn OverrideStore) -> Result<TileReport> {
    if !record.flags()?.contains(LandscapeFlags::HAS_VERTEX_COLORS) {
        return Ok(TileReport::new(TileOutcome::Unchanged));
    }

    let mut result = Ok(());
    store.get_or_add_override(record, &mut |o| result = o.strip_vertex_colors());
    result?;
    debug!("landscape {}: vertex colors removed", record.describe());
    Ok(TileReport::new(TileOutcome::Patched))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{AlphaEntry, FormId, Quadrant, VertexColor};
    use crate::error::Error;
    use crate::plugin::fixtures::*;
    use crate::plugin::{PatchMod, Plugin};
    use recolor_formula::ColorFormula;

    fn identity() -> FormulaSets {
        FormulaSets { snow: ColorFormula::identity(), standard: ColorFormula::identity() }
    }

    fn run(record: &LandscapeRecord, formulas: &FormulaSets) -> (Result<TileReport>, PatchMod) {
        let plugin = Plugin::new(textures(), Vec::new());
        let classifier = SnowClassifier::new(&plugin);
        let patch = PatchMod::new();
        let report = patch_tile(record, &classifier, formulas, &patch);
        (report, patch)
    }

    #[test]
    fn test_identity_formulas_write_nothing() {
        let record = landscape(0x10, SNOW, VertexColor::new(12, 34, 56));
        let before = record.clone();
        let (report, patch) = run(&record, &identity());
        assert_eq!(report.unwrap().outcome, TileOutcome::Unchanged);
        assert!(patch.is_empty());
        assert_eq!(record, before);
    }

    #[test]
    fn test_changed_colors_are_written_to_override() {
        let record = landscape(0x10, DIRT, VertexColor::new(12, 34, 56));
        let formulas = FormulaSets {
            snow: ColorFormula::identity(),
            standard: ColorFormula::compile("255", "G", "B"),
        };
        let (report, patch) = run(&record, &formulas);
        assert_eq!(report.unwrap().outcome, TileOutcome::Patched);

        let stored = patch.get(FormId(0x10)).unwrap();
        let colors = stored.read_vertex_colors().unwrap().unwrap();
        assert!(colors.as_slice().iter().all(|c| *c == VertexColor::new(255, 34, 56)));
        // Source record untouched, other subrecords copied
        assert_eq!(record.read_vertex_colors().unwrap().unwrap().get(0, 0), VertexColor::new(12, 34, 56));
        assert_eq!(stored.layers, record.layers);
        assert_eq!(stored.data, record.data);
    }

    #[test]
    fn test_snow_and_standard_regions() {
        let mut record = landscape(0x10, DIRT, VertexColor::new(100, 100, 100));
        record.layers.push(alpha_layer(SNOW, Quadrant::TopRight, &[AlphaEntry::at(16, 16, 0.9)]));
        let formulas = FormulaSets {
            snow: ColorFormula::compile("0", "0", "0"),
            standard: ColorFormula::compile("R", "G", "B"),
        };
        let (report, patch) = run(&record, &formulas);
        assert_eq!(report.unwrap().outcome, TileOutcome::Patched);

        let colors = patch.get(FormId(0x10)).unwrap().read_vertex_colors().unwrap().unwrap();
        assert_eq!(colors.get(32, 32), VertexColor::new(0, 0, 0));
        assert_eq!(colors.get(31, 32), VertexColor::new(100, 100, 100));
        assert_eq!(colors.get(0, 0), VertexColor::new(100, 100, 100));
    }

    #[test]
    fn test_tile_without_colors_is_skipped() {
        let mut record = landscape(0x10, DIRT, VertexColor::WHITE);
        record.vertex_colors = None;
        let formulas = FormulaSets { snow: ColorFormula::compile("0", "0", "0"), standard: ColorFormula::compile("0", "0", "0") };
        let (report, patch) = run(&record, &formulas);
        assert_eq!(report.unwrap().outcome, TileOutcome::Skipped);
        assert!(patch.is_empty());
    }

    #[test]
    fn test_malformed_tile_writes_nothing() {
        let mut record = landscape(0x10, DIRT, VertexColor::WHITE);
        record.vertex_colors = Some(vec![0; 100]);
        let (report, patch) = run(&record, &identity());
        assert!(matches!(report, Err(Error::InvalidLength { subrecord: "VCLR", .. })));
        assert!(patch.is_empty());

        let mut record = landscape(0x11, DIRT, VertexColor::WHITE);
        record.layers.push(crate::plugin::RawLayer::Base { header: vec![1, 2, 3] });
        let formulas = FormulaSets { snow: ColorFormula::compile("0", "0", "0"), standard: ColorFormula::compile("0", "0", "0") };
        let (report, patch) = run(&record, &formulas);
        assert!(report.is_err());
        assert!(patch.is_empty());
    }

    #[test]
    fn test_discarded_alpha_entries_reported() {
        let mut record = landscape(0x10, DIRT, VertexColor::WHITE);
        record.layers.push(alpha_layer(SNOW, Quadrant::BottomLeft, &[AlphaEntry::new(300, 1.0), AlphaEntry::at(0, 0, 1.0)]));
        let (report, _) = run(&record, &identity());
        let report = report.unwrap();
        assert_eq!(report.discarded_alpha_entries, 1);
        assert_eq!(report.outcome, TileOutcome::Unchanged);
    }

    #[test]
    fn test_remove_vertex_colors() {
        let record = landscape(0x10, DIRT, VertexColor::WHITE);
        let patch = PatchMod::new();
        assert_eq!(remove_vertex_colors(&record, &patch).unwrap().outcome, TileOutcome::Patched);
        let stored = patch.get(FormId(0x10)).unwrap();
        assert_eq!(stored.vertex_colors, None);
        assert!(!stored.flags().unwrap().contains(LandscapeFlags::HAS_VERTEX_COLORS));
        // Source keeps its colors
        assert!(record.vertex_colors.is_some());
    }

    #[test]
    fn test_remove_without_flag_is_unchanged() {
        let mut record = landscape(0x10, DIRT, VertexColor::WHITE);
        record.set_flags(LandscapeFlags::HAS_LAYERS);
        let patch = PatchMod::new();
        assert_eq!(remove_vertex_colors(&record, &patch).unwrap().outcome, TileOutcome::Unchanged);
        assert!(patch.is_empty());

        record.data = Some(vec![1]);
        assert!(remove_vertex_colors(&record, &patch).is_err());
        assert!(patch.is_empty());
    }
}
