//! Native binary storage format for discretizers.
//!
//! A 16-byte header followed by a Postcard-encoded [`Payload`].
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       4     Magic ("DSCR")
//! 4       1     Version major
//! 5       1     Version minor
//! 6       2     Flags (bitfield, little-endian)
//! 8       4     Payload size (bytes, little-endian)
//! 12      4     CRC32 checksum of payload (little-endian)
//! ```

use std::io::{Read, Write};

use super::payload::Payload;
use super::{LoadError, SaveError};

/// Magic bytes identifying a discretizer file.
pub const MAGIC: &[u8; 4] = b"DSCR";

/// Current format version (major).
pub const CURRENT_VERSION_MAJOR: u8 = 1;

/// Current format version (minor).
pub const CURRENT_VERSION_MINOR: u8 = 0;

/// Size of the format header in bytes.
pub const HEADER_SIZE: usize = 16;

// ============================================================================
// Format Flags
// ============================================================================

/// Bitfield flags describing the stored layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatFlags(u16);

impl FormatFlags {
    /// Boundaries were learned with adapt.
    pub const ADAPTED: u16 = 1 << 0;
    /// Layer emits sparse output.
    pub const SPARSE_OUTPUT: u16 = 1 << 1;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, flag: u16) -> bool {
        (self.0 & flag) != 0
    }

    pub fn set(&mut self, flag: u16) {
        self.0 |= flag;
    }
}

// ============================================================================
// Format Header
// ============================================================================

/// 16-byte header of the native format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatHeader {
    pub version_major: u8,
    pub version_minor: u8,
    pub flags: FormatFlags,
    /// Size of the payload in bytes.
    pub payload_size: u32,
    /// CRC32 checksum of the payload.
    pub checksum: u32,
}

impl FormatHeader {
    /// Create a header with the current version.
    pub fn new(flags: FormatFlags) -> Self {
        Self {
            version_major: CURRENT_VERSION_MAJOR,
            version_minor: CURRENT_VERSION_MINOR,
            flags,
            payload_size: 0,
            checksum: 0,
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(MAGIC);
        buf[4] = self.version_major;
        buf[5] = self.version_minor;
        buf[6..8].copy_from_slice(&self.flags.bits().to_le_bytes());
        buf[8..12].copy_from_slice(&self.payload_size.to_le_bytes());
        buf[12..16].copy_from_slice(&self.checksum.to_le_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Result<Self, LoadError> {
        if &buf[0..4] != MAGIC {
            return Err(LoadError::NotADiscretizer);
        }

        let version_major = buf[4];
        let version_minor = buf[5];
        if version_major > CURRENT_VERSION_MAJOR {
            return Err(LoadError::UnsupportedVersion {
                major: version_major,
                minor: version_minor,
            });
        }

        Ok(Self {
            version_major,
            version_minor,
            flags: FormatFlags::from_bits(u16::from_le_bytes([buf[6], buf[7]])),
            payload_size: u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]),
            checksum: u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]),
        })
    }
}

/// Compute CRC32 checksum of data.
pub fn compute_checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

// ============================================================================
// Read / Write
// ============================================================================

/// Encode `payload` and write it with its header.
pub fn write_payload<W: Write>(
    writer: &mut W,
    flags: FormatFlags,
    payload: &Payload,
) -> Result<(), SaveError> {
    let bytes = postcard::to_allocvec(payload)?;
    let payload_size = u32::try_from(bytes.len()).map_err(|_| SaveError::TooLarge(bytes.len()))?;

    let mut header = FormatHeader::new(flags);
    header.payload_size = payload_size;
    header.checksum = compute_checksum(&bytes);

    writer.write_all(&header.to_bytes())?;
    writer.write_all(&bytes)?;
    Ok(())
}

/// Read a header and its payload, verifying the checksum.
pub fn read_payload<R: Read>(reader: &mut R) -> Result<(FormatHeader, Payload), LoadError> {
    let mut header_buf = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header_buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            LoadError::Truncated {
                expected: HEADER_SIZE,
            }
        } else {
            LoadError::Io(e)
        }
    })?;
    let header = FormatHeader::from_bytes(&header_buf)?;

    // Grow with the data actually present instead of trusting the header size.
    let expected = header.payload_size as usize;
    let mut bytes = Vec::new();
    reader
        .take(u64::from(header.payload_size))
        .read_to_end(&mut bytes)?;
    if bytes.len() < expected {
        return Err(LoadError::Truncated {
            expected: HEADER_SIZE + expected,
        });
    }

    let actual = compute_checksum(&bytes);
    if actual != header.checksum {
        return Err(LoadError::ChecksumMismatch {
            expected: header.checksum,
            actual,
        });
    }

    let payload = postcard::from_bytes(&bytes)?;
    Ok((header, payload))
}

// ============================================================================
// Tests
// ============================================================================
