//! VRT binary mesh container loader
//!
//! VRT is a little-endian, length-prefixed container: an 8-byte magic marker
//! and a 4-byte version (both read but not validated against known values),
//! a default material-library name, then group records until the buffer
//! ends. Each record carries a group name, the material it uses, a
//! smoothing flag, and a compressed-geometry payload that is stored verbatim
//! for the host's decoder.
//!
//! The format has no checksum or redundancy, so every length prefix is
//! bounds-checked and truncation surfaces as [`AssetError::Truncated`].

use std::path::Path;

use crate::error::AssetError;
use crate::model::{ModelBuilder, ParsedObject};

/// Size of the magic marker at the start of a VRT buffer
pub const VRT_MAGIC_LEN: usize = 8;

/// Parsed VRT container
#[derive(Debug, Clone)]
pub struct VrtModel {
    /// Magic marker bytes as read from the header
    pub magic: [u8; VRT_MAGIC_LEN],
    /// Format version as read from the header; not validated
    pub version: u32,
    /// Default material library the records' material names refer to
    pub mtllib: String,
    /// One object per group record, in record order
    pub objects: Vec<ParsedObject>,
}

/// Bounds-checked little-endian cursor over a byte buffer
struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, len: usize, what: &'static str) -> Result<&'a [u8], AssetError> {
        if len > self.remaining() {
            return Err(AssetError::Truncated {
                what,
                offset: self.pos,
            });
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_u32(&mut self, what: &'static str) -> Result<u32, AssetError> {
        let bytes = self.take(4, what)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a 4-byte length prefix followed by that many bytes
    fn read_prefixed(&mut self, what: &'static str) -> Result<&'a [u8], AssetError> {
        let len = self.read_u32(what)? as usize;
        self.take(len, what)
    }

    fn read_prefixed_str(&mut self, what: &'static str) -> Result<String, AssetError> {
        let bytes = self.read_prefixed(what)?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| AssetError::InvalidUtf8(what))
    }
}

/// Loader for the VRT binary mesh format
pub struct VrtLoader;

impl VrtLoader {
    /// Parse a VRT buffer into per-object descriptors
    pub fn parse(bytes: &[u8]) -> Result<VrtModel, AssetError> {
        let mut reader = ByteReader::new(bytes);

        let mut magic = [0u8; VRT_MAGIC_LEN];
        magic.copy_from_slice(reader.take(VRT_MAGIC_LEN, "magic marker")?);
        let version = reader.read_u32("version")?;
        let mtllib = reader.read_prefixed_str("material library name")?;

        let libraries = vec![mtllib.clone()];
        let mut builder = ModelBuilder::new();
        let mut records = 0usize;

        while reader.remaining() > 0 {
            let group = reader.read_prefixed_str("group name")?;
            let material = reader.read_prefixed_str("material name")?;
            let smooth = reader.read_u32("smoothing flag")? == 1;
            let payload = reader.read_prefixed("compressed geometry")?;

            builder.start_object(&group);
            builder.start_material(&material, &libraries);
            builder.set_smoothing(smooth);
            builder.set_compressed_payload(payload.to_vec());
            records += 1;
        }

        let model = builder.finish();
        log::info!(
            "Parsed VRT buffer: {} record(s), {} object(s), mtllib {:?}, version {}",
            records,
            model.objects.len(),
            mtllib,
            version
        );

        Ok(VrtModel {
            magic,
            version,
            mtllib,
            objects: model.objects,
        })
    }

    /// Read and parse a VRT file from disk
    pub fn load_vrt<P: AsRef<Path>>(path: P) -> Result<VrtModel, AssetError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::parse(&bytes)
    }
}
