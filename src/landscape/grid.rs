//! Dense per-vertex texture map of one landscape tile

use tracing::warn;

use crate::codec::{FormId, TextureLayer, VertexColor, VertexColors, GRID_SIZE, QUADRANT_SIZE, VERTEX_COUNT};

/// One alpha layer's weight at one vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlphaContribution {
    pub texture: FormId,
    pub opacity: f32,
}

/// Texture data of one grid vertex. Colors live in the grid's buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vertex {
    pub x: usize,
    pub y: usize,
    pub base_texture: Option<FormId>,
    /// In layer declaration order
    pub overlays: Vec<AlphaContribution>,
}

/// A tile's 33x33 vertices together with the color buffer being rewritten
#[derive(Debug, Clone)]
pub struct LandscapeGrid {
    vertices: Vec<Vertex>,
    colors: VertexColors,
    /// Alpha entries dropped for out-of-range positions
    discarded_alpha_entries: usize,
}

impl LandscapeGrid {
    /// Build the grid from the tile's layers (declaration order) and current colors.
    ///
    /// Base layers overwrite the base texture of their whole quadrant, so the
    /// shared edge between quadrants keeps the later layer's texture. Alpha
    /// entries with positions outside the quadrant are logged and skipped.
    pub fn build(layers: &[TextureLayer], colors: VertexColors) -> Self {
        let mut vertices = Vec::with_capacity(VERTEX_COUNT);
        for y in 0..GRID_SIZE {
            for x in 0..GRID_SIZE {
                vertices.push(Vertex { x, y, ..Default::default() });
            }
        }

        let mut grid = Self {
            vertices,
            colors,
            discarded_alpha_entries: 0,
        };

        for layer in layers {
            let header = layer.header();
            let (offset_x, offset_y) = header.quadrant.offset();

            match layer {
                TextureLayer::Alpha { entries, .. } => {
                    for entry in entries {
                        match entry.local_coords() {
                            Ok((x, y)) => {
                                grid.vertex_mut(offset_x + x, offset_y + y).overlays.push(AlphaContribution {
                                    texture: header.texture,
                                    opacity: entry.opacity,
                                });
                            }
                            Err(e) => {
                                warn!("texture {} layer {}: {}, entry skipped", header.texture, header.layer, e);
                                grid.discarded_alpha_entries += 1;
                            }
                        }
                    }
                }
                TextureLayer::Base(_) => {
                    for y in 0..QUADRANT_SIZE {
                        for x in 0..QUADRANT_SIZE {
                            grid.vertex_mut(offset_x + x, offset_y + y).base_texture = Some(header.texture);
                        }
                    }
                }
            }
        }

        grid
    }

    pub fn vertex(&self, x: usize, y: usize) -> &Vertex {
        &self.vertices[VertexColors::index(x, y)]
    }

    fn vertex_mut(&mut self, x: usize, y: usize) -> &mut Vertex {
        &mut self.vertices[VertexColors::index(x, y)]
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn color(&self, x: usize, y: usize) -> VertexColor {
        self.colors.get(x, y)
    }

    /// Store a vertex color, returning whether it differs from the previous one
    pub fn set_color(&mut self, x: usize, y: usize, color: VertexColor) -> bool {
        let previous = self.colors.get(x, y);
        self.colors.set(x, y, color);
        previous != color
    }

    pub fn colors(&self) -> &VertexColors {
        &self.colors
    }

    pub fn into_colors(self) -> VertexColors {
        self.colors
    }

    pub fn discarded_alpha_entries(&self) -> usize {
        self.discarded_alpha_entries
    }
}
