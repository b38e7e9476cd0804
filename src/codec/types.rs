use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Vertices along one side of a landscape tile
pub const GRID_SIZE: usize = 33;
/// Vertices in a landscape tile
pub const VERTEX_COUNT: usize = GRID_SIZE * GRID_SIZE;
/// Vertices along one side of a quadrant (quadrants share their boundary)
pub const QUADRANT_SIZE: usize = 17;
/// Vertices in a quadrant
pub const QUADRANT_VERTEX_COUNT: usize = QUADRANT_SIZE * QUADRANT_SIZE;

/// Record identifier. Zero is the null reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormId(pub u32);

impl FormId {
    pub const NULL: FormId = FormId(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// `None` for the null reference
    pub fn non_null(self) -> Option<FormId> {
        if self.is_null() { None } else { Some(self) }
    }
}

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

/// Landscape vertex color (RGB, no alpha)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VertexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl VertexColor {
    pub const WHITE: VertexColor = VertexColor { r: 255, g: 255, b: 255 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    pub fn from_array([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

/// Quadrant a texture layer applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    BottomLeft,
    BottomRight,
    TopLeft,
    TopRight,
    /// Unrecognized tag, placed like `BottomLeft`
    Unknown(u8),
}

impl Quadrant {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::BottomLeft,
            1 => Self::BottomRight,
            2 => Self::TopLeft,
            3 => Self::TopRight,
            other => Self::Unknown(other),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            Self::BottomLeft => 0,
            Self::BottomRight => 1,
            Self::TopLeft => 2,
            Self::TopRight => 3,
            Self::Unknown(v) => v,
        }
    }

    /// Offset of the quadrant's local (0, 0) vertex in the tile grid
    pub fn offset(self) -> (usize, usize) {
        match self {
            Self::BottomLeft => (0, 0),
            Self::BottomRight => (16, 0),
            Self::TopLeft => (0, 16),
            Self::TopRight => (16, 16),
            Self::Unknown(_) => (0, 0),
        }
    }
}

bitflags! {
    /// Landscape DATA flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LandscapeFlags: u32 {
        const HAS_VERTEX_NORMALS = 0x0001;
        const HAS_VERTEX_COLORS = 0x0002;
        const HAS_LAYERS = 0x0004;
        const AUTO_CALC_NORMALS = 0x0010;
        const IGNORED = 0x0400;
    }
}

bitflags! {
    /// Landscape texture flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureFlags: u8 {
        const IS_SNOW = 0x01;
    }
}
