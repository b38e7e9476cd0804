use super::types::{FormId, VertexColor};

/// Binary writer for landscape subrecord payloads
pub struct BinaryWriter {
    data: Vec<u8>,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { data: Vec::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn write_u8(&mut self, v: u8) {
        self.data.push(v);
    }

    pub fn write_u16_le(&mut self, v: u16) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u32_le(&mut self, v: u32) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_f32_le(&mut self, v: f32) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_form_id(&mut self, id: FormId) {
        self.write_u32_le(id.0);
    }

    pub fn write_vertex_color(&mut self, color: VertexColor) {
        self.write_u8(color.r);
        self.write_u8(color.g);
        self.write_u8(color.b);
    }
}

impl Default for BinaryWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::BinaryReader;

    #[test]
    fn test_write_primitives() {
        let mut writer = BinaryWriter::new();
        writer.write_u8(0x01);
        writer.write_u16_le(0x0302);
        writer.write_u32_le(0x07060504);
        assert_eq!(writer.into_vec(), vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07]);
    }

    #[test]
    fn test_form_id_layout() {
        let mut writer = BinaryWriter::with_capacity(4);
        writer.write_form_id(FormId(0x0001_2EB7));
        assert_eq!(writer.len(), 4);
        let bytes = writer.into_vec();
        assert_eq!(bytes, vec![0xB7, 0x2E, 0x01, 0x00]);
        assert_eq!(BinaryReader::new(&bytes).read_form_id().unwrap(), FormId(0x0001_2EB7));
    }
}
