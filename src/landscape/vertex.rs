//! Per-vertex snow coverage and recoloring

use recolor_formula::ColorFormula;

use crate::codec::VertexColor;
use super::classifier::SnowClassifier;
use super::grid::{LandscapeGrid, Vertex};

/// Snow coverage above which a vertex uses the snow formulas
pub const SNOW_THRESHOLD: f32 = 0.2;

/// Which formula set a vertex is recolored with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormulaKind {
    Snow,
    Standard,
}

impl FormulaKind {
    pub fn for_coverage(snow: f32) -> Self {
        if snow > SNOW_THRESHOLD {
            FormulaKind::Snow
        } else {
            FormulaKind::Standard
        }
    }
}

/// Snow and standard formulas of one run
#[derive(Debug)]
pub struct FormulaSets {
    pub snow: ColorFormula,
    pub standard: ColorFormula,
}

impl FormulaSets {
    pub fn get(&self, kind: FormulaKind) -> &ColorFormula {
        match kind {
            FormulaKind::Snow => &self.snow,
            FormulaKind::Standard => &self.standard,
        }
    }
}

impl Vertex {
    /// Opacity-weighted snow fraction of this vertex.
    ///
    /// Stops classifying overlays once the threshold is crossed. Below the
    /// threshold, weight not claimed by overlays belongs to the base texture.
    pub fn snow_coverage(&self, classifier: &SnowClassifier<'_>) -> f32 {
        let mut snow = 0f32;
        let mut not_snow = 0f32;

        for overlay in &self.overlays {
            if classifier.is_snow(Some(overlay.texture)) {
                snow += overlay.opacity;
            } else {
                not_snow += overlay.opacity;
            }
            if snow > SNOW_THRESHOLD {
                break;
            }
        }

        if snow <= SNOW_THRESHOLD {
            let missing = 1.0 - snow - not_snow;
            if missing > 0.0 && classifier.is_snow(self.base_texture) {
                snow += missing;
            }
        }

        snow
    }

    pub fn formula_kind(&self, classifier: &SnowClassifier<'_>) -> FormulaKind {
        FormulaKind::for_coverage(self.snow_coverage(classifier))
    }
}

impl LandscapeGrid {
    /// Recolor vertex `(x, y)`, returning whether its color changed
    pub fn blend_vertex(&mut self, x: usize, y: usize, classifier: &SnowClassifier<'_>, formulas: &FormulaSets) -> bool {
        let kind = self.vertex(x, y).formula_kind(classifier);
        let color = self.color(x, y);
        let recolored = VertexColor::from_array(formulas.get(kind).apply(color.to_array()));
        self.set_color(x, y, recolored)
    }
}
