//! SPD CRC-16 (polynomial 0x1021, initial value 0, MSB first).
//!
//! DDR4 stores two checksums: one over the base configuration block and one
//! over the module-specific block. Both are little-endian.

use serde::Serialize;

use crate::constants::{CRC_BASE, CRC_MODULE};
use crate::image::SpdImage;

pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for byte in data {
        crc ^= u16::from(*byte) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrcSection {
    /// Bytes 0..=125, stored at 126-127.
    Base,
    /// Bytes 128..=253, stored at 254-255.
    Module,
}

impl CrcSection {
    pub const ALL: [CrcSection; 2] = [CrcSection::Base, CrcSection::Module];

    pub fn covered(self) -> std::ops::Range<usize> {
        match self {
            CrcSection::Base => 0..CRC_BASE,
            CrcSection::Module => 128..CRC_MODULE,
        }
    }

    pub fn stored_at(self) -> usize {
        match self {
            CrcSection::Base => CRC_BASE,
            CrcSection::Module => CRC_MODULE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CrcCheck {
    pub section: CrcSection,
    pub stored: u16,
    pub computed: u16,
    pub ok: bool,
}

pub fn check_section(image: &SpdImage, section: CrcSection) -> CrcCheck {
    let at = section.stored_at();
    let stored = u16::from_le_bytes([image[at], image[at + 1]]);
    let computed = crc16(&image[section.covered()]);
    if stored != computed {
        tracing::warn!(
            section = ?section,
            stored = format_args!("0x{stored:04X}"),
            computed = format_args!("0x{computed:04X}"),
            "stored crc does not match"
        );
    }
    CrcCheck {
        section,
        stored,
        computed,
        ok: stored == computed,
    }
}

pub fn check_crc(image: &SpdImage) -> [CrcCheck; 2] {
    CrcSection::ALL.map(|section| check_section(image, section))
}

pub fn crc_ok(image: &SpdImage) -> bool {
    check_crc(image).iter().all(|c| c.ok)
}

/// Rewrites both stored checksums. Returns `true` if any byte changed.
pub fn fix_crc(image: &mut SpdImage) -> bool {
    let mut changed = false;
    for check in check_crc(image) {
        if !check.ok {
            let at = check.section.stored_at();
            image[at..at + 2].copy_from_slice(&check.computed.to_le_bytes());
            tracing::debug!(
                section = ?check.section,
                stored = check.stored,
                computed = check.computed,
                "crc rewritten"
            );
            changed = true;
        }
    }
    changed
}
