use std::fmt;

use md5::{Digest, Md5};

/// A 128-bit digest of a tile's decoded pixel buffer.
///
/// The digest is computed over the raw row-major RGBA bytes, not the PNG
/// stream, so two tiles with identical pixels collide regardless of encoder
/// settings. md5 is fine here: the hash is an equality key, not a security
/// boundary, and a collision merely links one wrong tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelHash([u8; 16]);

impl PixelHash {
    pub fn of_pixels(bytes: &[u8]) -> Self {
        Self(Md5::digest(bytes).into())
    }

    /// Parse the 32-hex-char form used in tile filenames.
    pub fn from_hex(s: &str) -> Option<Self> {
        let raw = hex::decode(s).ok()?;
        raw.try_into().ok().map(Self)
    }
}

impl fmt::Display for PixelHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}
