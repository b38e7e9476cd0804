//! World data: landscape textures and landscape records, loaded from and saved
//! to JSON plugin files (gzip-compressed when the path ends in `.gz`).

pub mod patch;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::codec::{
    decode_alpha_data, decode_flags, encode_flags, FormId, LandscapeFlags, LayerHeader,
    TextureFlags, TextureLayer, VertexColors,
};
use crate::error::{Error, Result};
use crate::landscape::{ResolvedTexture, TextureResolver};

pub use patch::{OverrideStore, PatchMod};

/// Landscape texture record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandscapeTexture {
    pub form_id: FormId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<u8>,
}

/// Raw texture layer subrecords
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawLayer {
    /// BTXT
    Base { header: Vec<u8> },
    /// ATXT + optional VTXT
    Alpha {
        header: Vec<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alpha: Option<Vec<u8>>,
    },
}

impl RawLayer {
    pub fn decode(&self) -> Result<TextureLayer> {
        match self {
            RawLayer::Base { header } => Ok(TextureLayer::Base(LayerHeader::decode("BTXT", header)?)),
            RawLayer::Alpha { header, alpha } => Ok(TextureLayer::Alpha {
                header: LayerHeader::decode("ATXT", header)?,
                entries: match alpha {
                    Some(data) => decode_alpha_data(data)?,
                    None => Vec::new(),
                },
            }),
        }
    }
}

/// Landscape record: one tile's raw subrecords
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandscapeRecord {
    pub form_id: FormId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell: Option<String>,
    /// DATA
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
    /// VCLR
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex_colors: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layers: Vec<RawLayer>,
}

impl LandscapeRecord {
    pub fn flags(&self) -> Result<LandscapeFlags> {
        let data = self.data.as_deref().ok_or(Error::MissingSubrecord("DATA"))?;
        decode_flags(data)
    }

    pub fn set_flags(&mut self, flags: LandscapeFlags) {
        self.data = Some(encode_flags(flags));
    }

    /// `None` when the record has no vertex colors
    pub fn read_vertex_colors(&self) -> Result<Option<VertexColors>> {
        self.vertex_colors.as_deref().map(VertexColors::decode).transpose()
    }

    pub fn write_vertex_colors(&mut self, colors: &VertexColors) {
        self.vertex_colors = Some(colors.encode());
    }

    /// Clear the vertex colors flag and drop the color buffer
    pub fn strip_vertex_colors(&mut self) -> Result<()> {
        let flags = self.flags()?;
        self.set_flags(flags - LandscapeFlags::HAS_VERTEX_COLORS);
        self.vertex_colors = None;
        Ok(())
    }

    pub fn read_layers(&self) -> Result<Vec<TextureLayer>> {
        self.layers.iter().map(RawLayer::decode).collect()
    }

    /// Label for log messages
    pub fn describe(&self) -> String {
        match &self.cell {
            Some(cell) => format!("{} ({})", self.form_id, cell),
            None => self.form_id.to_string(),
        }
    }
}

/// On-disk plugin layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct PluginFile {
    #[serde(default)]
    textures: Vec<LandscapeTexture>,
    #[serde(default)]
    landscapes: Vec<LandscapeRecord>,
}

/// Loaded world data
#[derive(Debug, Clone, Default)]
pub struct Plugin {
    pub textures: IndexMap<FormId, LandscapeTexture>,
    pub landscapes: Vec<LandscapeRecord>,
}

impl Plugin {
    /// Later records replace earlier ones with the same form id, keeping the
    /// position of the first.
    pub fn new(textures: Vec<LandscapeTexture>, landscapes: Vec<LandscapeRecord>) -> Self {
        let mut by_id: IndexMap<FormId, LandscapeRecord> = IndexMap::with_capacity(landscapes.len());
        for record in landscapes {
            if let Some(previous) = by_id.insert(record.form_id, record) {
                warn!("landscape {} defined more than once, keeping the last definition", previous.describe());
            }
        }
        Self {
            textures: textures.into_iter().map(|t| (t.form_id, t)).collect(),
            landscapes: by_id.into_values().collect(),
        }
    }

    pub fn from_json(reader: impl Read) -> Result<Self> {
        let file: PluginFile = serde_json::from_reader(reader)?;
        Ok(Self::new(file.textures, file.landscapes))
    }

    pub fn to_json(&self, writer: impl Write) -> Result<()> {
        let file = PluginFile {
            textures: self.textures.values().cloned().collect(),
            landscapes: self.landscapes.clone(),
        };
        serde_json::to_writer_pretty(writer, &file)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = BufReader::new(File::open(path)?);
        if is_gzip(path) {
            Self::from_json(GzDecoder::new(file))
        } else {
            Self::from_json(file)
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = BufWriter::new(File::create(path)?);
        if is_gzip(path) {
            let mut encoder = GzEncoder::new(file, Compression::default());
            self.to_json(&mut encoder)?;
            encoder.finish()?.flush()?;
        } else {
            let mut file = file;
            self.to_json(&mut file)?;
            file.flush()?;
        }
        Ok(())
    }

    pub fn landscape(&self, form_id: FormId) -> Option<&LandscapeRecord> {
        self.landscapes.iter().find(|l| l.form_id == form_id)
    }
}

impl TextureResolver for Plugin {
    fn resolve_texture(&self, id: FormId) -> Option<ResolvedTexture> {
        self.textures.get(&id).map(|t| ResolvedTexture {
            form_id: t.form_id,
            flags: t.flags.map(TextureFlags::from_bits_retain),
        })
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext.eq_ignore_ascii_case("gz"))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::codec::{encode_alpha_data, AlphaEntry, Quadrant, VertexColor};

    pub const SNOW: FormId = FormId(0x0001_0001);
    pub const DIRT: FormId = FormId(0x0001_0002);

    pub fn textures() -> Vec<LandscapeTexture> {
        vec![
            LandscapeTexture { form_id: SNOW, editor_id: Some("LSnow01".into()), flags: Some(0x01) },
            LandscapeTexture { form_id: DIRT, editor_id: Some("LDirt01".into()), flags: Some(0x00) },
        ]
    }

    pub fn base_layer(texture: FormId, quadrant: Quadrant) -> RawLayer {
        RawLayer::Base { header: LayerHeader::new(texture, quadrant, 0).encode() }
    }

    pub fn alpha_layer(texture: FormId, quadrant: Quadrant, entries: &[AlphaEntry]) -> RawLayer {
        RawLayer::Alpha {
            header: LayerHeader::new(texture, quadrant, 1).encode(),
            alpha: Some(encode_alpha_data(entries)),
        }
    }

    /// Tile with colored vertices and the given base texture on all quadrants
    pub fn landscape(form_id: u32, base: FormId, color: VertexColor) -> LandscapeRecord {
        LandscapeRecord {
            form_id: FormId(form_id),
            cell: None,
            data: Some(encode_flags(LandscapeFlags::HAS_VERTEX_NORMALS | LandscapeFlags::HAS_VERTEX_COLORS | LandscapeFlags::HAS_LAYERS)),
            vertex_colors: Some(VertexColors::filled(color).encode()),
            layers: (0..4).map(|q| base_layer(base, Quadrant::from_u8(q))).collect(),
        }
    }
}
