//! Owned output of [`crate::encode`].
//!
//! `EncodedValue` holds its own copy of the bytes. Nothing in it borrows
//! from the `EValue` it was produced from.

use ev_core::Tag;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodedValue {
    tag: Tag,
    data: Vec<u8>,
}

impl EncodedValue {
    /// `data[0]` must already be `tag.as_byte()`.
    pub(crate) fn new(tag: Tag, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.first().copied(), Some(tag.as_byte()));
        Self { tag, data }
    }

    /// Kind this buffer was encoded from.
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Full buffer, tag byte included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Bytes after the tag.
    pub fn payload(&self) -> &[u8] {
        &self.data[1..]
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Lowercase hex, one space between bytes: `04 00 00 00 01`.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(self.data.len() * 3);
        for (i, byte) in self.data.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            let _ = write!(&mut out, "{byte:02x}");
        }
        out
    }
}

impl AsRef<[u8]> for EncodedValue {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl From<EncodedValue> for Vec<u8> {
    fn from(value: EncodedValue) -> Self {
        value.into_bytes()
    }
}
