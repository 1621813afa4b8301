//! Byte-level primitives the property tree format and the save-file header
//! are both built from (§4.1).

use fmm_model::{GameVersion, Version};

use crate::error::{CodecError, CodecResult};

/// A forward-only cursor over a borrowed byte slice.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize, what: &str) -> CodecResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(CodecError::short_read(what));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_bytes(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        self.take(n, "raw bytes")
    }

    pub fn skip(&mut self, n: usize) -> CodecResult<()> {
        self.take(n, "padding")?;
        Ok(())
    }

    pub fn read_u8(&mut self) -> CodecResult<u8> {
        Ok(self.take(1, "u8")?[0])
    }

    pub fn read_u16(&mut self) -> CodecResult<u16> {
        let b = self.take(2, "u16")?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> CodecResult<u32> {
        let b = self.take(4, "u32")?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i64(&mut self) -> CodecResult<i64> {
        let b = self.take(8, "i64")?;
        Ok(i64::from_le_bytes(b.try_into().unwrap()))
    }

    pub fn read_u64(&mut self) -> CodecResult<u64> {
        let b = self.take(8, "u64")?;
        Ok(u64::from_le_bytes(b.try_into().unwrap()))
    }

    pub fn read_space_optim_u16(&mut self) -> CodecResult<u16> {
        let n = self.read_u8()?;
        if n < 0xFF {
            Ok(n as u16)
        } else {
            self.read_u16()
        }
    }

    pub fn read_space_optim_u32(&mut self) -> CodecResult<u32> {
        let n = self.read_u8()?;
        if n < 0xFF {
            Ok(n as u32)
        } else {
            self.read_u32()
        }
    }

    pub fn read_bool(&mut self) -> CodecResult<bool> {
        match self.read_u8()? {
            0x01 => Ok(true),
            0x00 => Ok(false),
            _ => Err(CodecError::out_of_range("bool")),
        }
    }

    pub fn read_string(&mut self) -> CodecResult<String> {
        let len = self.read_space_optim_u32()? as usize;
        let bytes = self.take(len, "string")?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::FormatError("invalid utf8 in string".into()))
    }

    /// Length-prefixed boolean-wrapped string: one boolean; if true the
    /// value is empty, else a string follows.
    pub fn read_string_property(&mut self) -> CodecResult<String> {
        if self.read_bool()? {
            Ok(String::new())
        } else {
            self.read_string()
        }
    }

    pub fn read_double(&mut self) -> CodecResult<f64> {
        let b = self.take(8, "double")?;
        Ok(f64::from_le_bytes(b.try_into().unwrap()))
    }

    pub fn read_game_version(&mut self) -> CodecResult<GameVersion> {
        Ok(GameVersion::new(
            self.read_u16()?,
            self.read_u16()?,
            self.read_u16()?,
            self.read_u16()?,
        ))
    }

    /// Three-component version, each a space-optimized `u16`.
    pub fn read_version3(&mut self) -> CodecResult<Version> {
        Ok(Version::new(
            self.read_space_optim_u16()?,
            self.read_space_optim_u16()?,
            self.read_space_optim_u16()?,
        ))
    }
}

/// An append-only byte buffer with the same primitive vocabulary as [`Reader`].
#[derive(Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Encodes the shortest of the two forms: a single byte when the value
    /// fits under `0xFF`, else a `0xFF` marker followed by the full-width
    /// little-endian value.
    pub fn write_space_optim_u16(&mut self, v: u16) {
        if v < 0xFF {
            self.write_u8(v as u8);
        } else {
            self.write_u8(0xFF);
            self.write_u16(v);
        }
    }

    pub fn write_space_optim_u32(&mut self, v: u32) {
        if v < 0xFF {
            self.write_u8(v as u8);
        } else {
            self.write_u8(0xFF);
            self.write_u32(v);
        }
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(if v { 0x01 } else { 0x00 });
    }

    pub fn write_string(&mut self, s: &str) {
        self.write_space_optim_u32(s.len() as u32);
        self.buf.extend_from_slice(s.as_bytes());
    }

    pub fn write_string_property(&mut self, s: &str) {
        if s.is_empty() {
            self.write_bool(true);
        } else {
            self.write_bool(false);
            self.write_string(s);
        }
    }

    pub fn write_double(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_game_version(&mut self, v: GameVersion) {
        self.write_u16(v.major);
        self.write_u16(v.minor);
        self.write_u16(v.patch);
        self.write_u16(v.build);
    }

    pub fn write_version3(&mut self, v: Version) {
        self.write_space_optim_u16(v.major);
        self.write_space_optim_u16(v.minor);
        self.write_space_optim_u16(v.patch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_optim_u16_picks_shortest_form() {
        let mut w = Writer::new();
        w.write_space_optim_u16(10);
        w.write_space_optim_u16(300);
        let bytes = w.into_bytes();
        assert_eq!(bytes[0], 10);
        assert_eq!(bytes[1], 0xFF);

        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_space_optim_u16().unwrap(), 10);
        assert_eq!(r.read_space_optim_u16().unwrap(), 300);
    }

    #[test]
    fn boundary_value_uses_long_form() {
        let mut w = Writer::new();
        w.write_space_optim_u32(0xFF);
        let bytes = w.into_bytes();
        assert_eq!(bytes[0], 0xFF);
        assert_eq!(bytes.len(), 5);

        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_space_optim_u32().unwrap(), 0xFF);
    }

    #[test]
    fn string_property_round_trips_empty_and_nonempty() {
        let mut w = Writer::new();
        w.write_string_property("");
        w.write_string_property("hello");
        let bytes = w.into_bytes();

        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_string_property().unwrap(), "");
        assert_eq!(r.read_string_property().unwrap(), "hello");
    }

    #[test]
    fn game_version_is_four_raw_u16s() {
        let mut w = Writer::new();
        w.write_game_version(GameVersion::new(1, 1, 110, 64));
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), GameVersion::ENCODED_LEN);

        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_game_version().unwrap(), GameVersion::new(1, 1, 110, 64));
    }

    #[test]
    fn short_read_is_a_format_error() {
        let bytes = [0x05u8];
        let mut r = Reader::new(&bytes);
        assert!(r.read_u32().is_err());
    }

    #[test]
    fn invalid_bool_byte_is_a_format_error() {
        let bytes = [0x02u8];
        let mut r = Reader::new(&bytes);
        assert!(r.read_bool().is_err());
    }
}
