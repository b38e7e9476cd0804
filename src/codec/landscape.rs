//! Landscape subrecord payloads
//!
//! - `DATA`: u32 flag word
//! - `VCLR`: 33 rows (south to north) of 33 RGB vertex colors
//! - `BTXT`/`ATXT`: texture form id, quadrant, unused byte, u16 layer index
//! - `VTXT`: repeated (u16 position, u16 unused, f32 opacity), position = y * 17 + x

use crate::error::{Error, Result};
use super::reader::BinaryReader;
use super::writer::BinaryWriter;
use super::types::{
    FormId, LandscapeFlags, Quadrant, VertexColor,
    GRID_SIZE, QUADRANT_SIZE, QUADRANT_VERTEX_COUNT, VERTEX_COUNT,
};

pub const DATA_LEN: usize = 4;
pub const VCLR_LEN: usize = VERTEX_COUNT * 3;
pub const LAYER_HEADER_LEN: usize = 8;
pub const ALPHA_ENTRY_LEN: usize = 8;

pub fn decode_flags(data: &[u8]) -> Result<LandscapeFlags> {
    if data.len() != DATA_LEN {
        return Err(Error::InvalidLength { subrecord: "DATA", expected: DATA_LEN, actual: data.len() });
    }
    let bits = BinaryReader::new(data).read_u32_le()?;
    Ok(LandscapeFlags::from_bits_retain(bits))
}

pub fn encode_flags(flags: LandscapeFlags) -> Vec<u8> {
    flags.bits().to_le_bytes().to_vec()
}

/// Dense 33x33 vertex color buffer, indexed by `(x, y)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexColors {
    colors: Vec<VertexColor>,
}

impl VertexColors {
    pub fn filled(color: VertexColor) -> Self {
        Self { colors: vec![color; VERTEX_COUNT] }
    }

    pub fn index(x: usize, y: usize) -> usize {
        debug_assert!(x < GRID_SIZE && y < GRID_SIZE);
        y * GRID_SIZE + x
    }

    pub fn get(&self, x: usize, y: usize) -> VertexColor {
        self.colors[Self::index(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, color: VertexColor) {
        self.colors[Self::index(x, y)] = color;
    }

    pub fn as_slice(&self) -> &[VertexColor] {
        &self.colors
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() != VCLR_LEN {
            return Err(Error::InvalidLength { subrecord: "VCLR", expected: VCLR_LEN, actual: data.len() });
        }
        let mut reader = BinaryReader::new(data);
        let mut colors = Vec::with_capacity(VERTEX_COUNT);
        for _ in 0..VERTEX_COUNT {
            colors.push(reader.read_vertex_color()?);
        }
        Ok(Self { colors })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::with_capacity(VCLR_LEN);
        for color in &self.colors {
            writer.write_vertex_color(*color);
        }
        writer.into_vec()
    }
}

/// BTXT/ATXT header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerHeader {
    pub texture: FormId,
    pub quadrant: Quadrant,
    pub unused: u8,
    pub layer: u16,
}

impl LayerHeader {
    pub fn new(texture: FormId, quadrant: Quadrant, layer: u16) -> Self {
        Self { texture, quadrant, unused: 0, layer }
    }

    pub fn decode(subrecord: &'static str, data: &[u8]) -> Result<Self> {
        if data.len() < LAYER_HEADER_LEN {
            return Err(Error::InvalidLength { subrecord, expected: LAYER_HEADER_LEN, actual: data.len() });
        }
        let mut reader = BinaryReader::new(data);
        Ok(Self {
            texture: reader.read_form_id()?,
            quadrant: Quadrant::from_u8(reader.read_u8()?),
            unused: reader.read_u8()?,
            layer: reader.read_u16_le()?,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::with_capacity(LAYER_HEADER_LEN);
        writer.write_form_id(self.texture);
        writer.write_u8(self.quadrant.to_u8());
        writer.write_u8(self.unused);
        writer.write_u16_le(self.layer);
        writer.into_vec()
    }
}

/// One VTXT entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlphaEntry {
    pub position: u16,
    pub unused: u16,
    pub opacity: f32,
}

impl AlphaEntry {
    pub fn new(position: u16, opacity: f32) -> Self {
        Self { position, unused: 0, opacity }
    }

    /// Entry for the quadrant-local vertex `(x, y)`
    pub fn at(x: usize, y: usize, opacity: f32) -> Self {
        Self::new((y * QUADRANT_SIZE + x) as u16, opacity)
    }

    /// Quadrant-local `(x, y)`; `x = position % 17`, `y = position / 17`
    pub fn local_coords(&self) -> Result<(usize, usize)> {
        let position = self.position as usize;
        if position >= QUADRANT_VERTEX_COUNT {
            return Err(Error::AlphaPositionOutOfRange { position: self.position });
        }
        Ok((position % QUADRANT_SIZE, position / QUADRANT_SIZE))
    }
}

pub fn decode_alpha_data(data: &[u8]) -> Result<Vec<AlphaEntry>> {
    if data.len() % ALPHA_ENTRY_LEN != 0 {
        return Err(Error::Misaligned { subrecord: "VTXT", len: data.len(), stride: ALPHA_ENTRY_LEN });
    }
    let mut reader = BinaryReader::new(data);
    let mut entries = Vec::with_capacity(data.len() / ALPHA_ENTRY_LEN);
    while !reader.is_empty() {
        entries.push(AlphaEntry {
            position: reader.read_u16_le()?,
            unused: reader.read_u16_le()?,
            opacity: reader.read_f32_le()?,
        });
    }
    Ok(entries)
}

pub fn encode_alpha_data(entries: &[AlphaEntry]) -> Vec<u8> {
    let mut writer = BinaryWriter::with_capacity(entries.len() * ALPHA_ENTRY_LEN);
    for entry in entries {
        writer.write_u16_le(entry.position);
        writer.write_u16_le(entry.unused);
        writer.write_f32_le(entry.opacity);
    }
    writer.into_vec()
}

/// Decoded texture layer, in declaration order
#[derive(Debug, Clone, PartialEq)]
pub enum TextureLayer {
    /// Covers its whole quadrant
    Base(LayerHeader),
    /// Blended over the base with per-vertex opacity
    Alpha {
        header: LayerHeader,
        entries: Vec<AlphaEntry>,
    },
}

impl TextureLayer {
    pub fn header(&self) -> &LayerHeader {
        match self {
            TextureLayer::Base(header) => header,
            TextureLayer::Alpha { header, .. } => header,
        }
    }
}
