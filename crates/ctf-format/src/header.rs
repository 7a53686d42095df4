//! The fixed-size header at the start of every CTF buffer, and the
//! section offsets it carries.

use crate::error::{FormatError, Result};
use crate::limits::{CTF_MAGIC, CTF_VERSION, HEADER_SIZE};

/// `CTF_F_COMPRESS` is never set by this writer; the flags byte exists
/// so a reader can tell a foreign producer from a corrupt buffer.
pub const FLAG_COMPRESS: u8 = 0x1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub magic: u16,
    pub version: u8,
    pub flags: u8,
    /// Snapshot id of the parent container this buffer was labeled
    /// against, or 0 for a root container.
    pub parent_label: u32,
    /// String-table offset of the parent container's name, or 0.
    pub parent_name: u32,
    pub label_off: u32,
    pub obj_off: u32,
    pub func_off: u32,
    pub var_off: u32,
    pub type_off: u32,
    pub str_off: u32,
    pub str_len: u32,
}

const _: () = assert!(std::mem::size_of::<[u32; 9]>() + 2 + 1 + 1 == HEADER_SIZE);

impl Default for Header {
    fn default() -> Self {
        Header {
            magic: CTF_MAGIC,
            version: CTF_VERSION,
            flags: 0,
            parent_label: 0,
            parent_name: 0,
            label_off: 0,
            obj_off: 0,
            func_off: 0,
            var_off: 0,
            type_off: 0,
            str_off: 0,
            str_len: 0,
        }
    }
}

impl Header {
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..2].copy_from_slice(&self.magic.to_le_bytes());
        buf[2] = self.version;
        buf[3] = self.flags;
        buf[4..8].copy_from_slice(&self.parent_label.to_le_bytes());
        buf[8..12].copy_from_slice(&self.parent_name.to_le_bytes());
        buf[12..16].copy_from_slice(&self.label_off.to_le_bytes());
        buf[16..20].copy_from_slice(&self.obj_off.to_le_bytes());
        buf[20..24].copy_from_slice(&self.func_off.to_le_bytes());
        buf[24..28].copy_from_slice(&self.var_off.to_le_bytes());
        buf[28..32].copy_from_slice(&self.type_off.to_le_bytes());
        buf[32..36].copy_from_slice(&self.str_off.to_le_bytes());
        buf[36..40].copy_from_slice(&self.str_len.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Header> {
        if buf.len() < HEADER_SIZE {
            return Err(FormatError::Truncated(buf.len()));
        }
        let u32_at = |off: usize| u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
        let header = Header {
            magic: u16::from_le_bytes(buf[0..2].try_into().unwrap()),
            version: buf[2],
            flags: buf[3],
            parent_label: u32_at(4),
            parent_name: u32_at(8),
            label_off: u32_at(12),
            obj_off: u32_at(16),
            func_off: u32_at(20),
            var_off: u32_at(24),
            type_off: u32_at(28),
            str_off: u32_at(32),
            str_len: u32_at(36),
        };
        header.validate_magic()?;
        header.validate_version()?;
        Ok(header)
    }

    pub fn validate_magic(&self) -> Result<()> {
        if self.magic != CTF_MAGIC {
            return Err(FormatError::BadMagic(self.magic));
        }
        Ok(())
    }

    pub fn validate_version(&self) -> Result<()> {
        if self.version != CTF_VERSION {
            return Err(FormatError::BadVersion(self.version));
        }
        Ok(())
    }

    pub fn is_child(&self) -> bool {
        self.parent_name != 0 || self.parent_label != 0
    }
}

#[cfg(test)]
#[path = "header_tests.rs"]
mod header_tests;
