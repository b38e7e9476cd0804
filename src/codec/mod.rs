pub mod reader;
pub mod writer;
pub mod types;
pub mod landscape;

pub use reader::BinaryReader;
pub use writer::BinaryWriter;
pub use types::*;
pub use landscape::{
    AlphaEntry, LayerHeader, TextureLayer, VertexColors,
    decode_alpha_data, encode_alpha_data, decode_flags, encode_flags,
    VCLR_LEN, LAYER_HEADER_LEN, ALPHA_ENTRY_LEN,
};
