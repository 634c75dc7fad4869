//! Two-byte JEP106 manufacturer codes (module: 320-321, DRAM: 350-351).

use std::fmt;

use serde::Serialize;

use crate::constants::{DRAM_MANUFACTURER_ID, MODULE_MANUFACTURER_ID};
use crate::error::{SpdError, SpdResult};
use crate::image::{with_odd_parity, SpdImage};
use crate::manufacturers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Manufacturer {
    /// 1-based JEP106 bank (continuation count + 1).
    pub bank: u8,
    /// 7-bit identifier without parity.
    pub id: u8,
    pub raw: [u8; 2],
    /// Registry name, `None` for codes the registry does not know.
    pub name: Option<&'static str>,
    /// The name came from the exact `(bank, id)` key rather than the
    /// unique-id fallback.
    pub bank_resolved: bool,
}

impl Manufacturer {
    /// The exact `(bank, id)` key is authoritative. Only when it misses is
    /// an id carried by a single registry entry accepted regardless of bank.
    pub fn decode(raw: [u8; 2]) -> Manufacturer {
        let bank = (raw[0] & 0x7F) + 1;
        let id = raw[1] & 0x7F;
        let exact = manufacturers::lookup(bank, id);
        let entry = exact.or_else(|| manufacturers::lookup_unique_id(id));
        if exact.is_none() {
            if let Some(entry) = entry {
                tracing::debug!(bank, id, name = entry.name, "manufacturer matched by id only");
            }
        }
        Manufacturer {
            bank,
            id,
            raw,
            name: entry.map(|m| m.name),
            bank_resolved: exact.is_some(),
        }
    }

    pub fn is_known(&self) -> bool {
        self.name.is_some()
    }
}

impl fmt::Display for Manufacturer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => f.write_str(name),
            None => write!(f, "Unknown (0x{:02X}{:02X})", self.raw[0], self.raw[1]),
        }
    }
}

/// Encodes a registry name (full or short) to its two SPD bytes, each
/// carrying an odd-parity bit.
pub fn encode_manufacturer(name: &str) -> SpdResult<[u8; 2]> {
    let entry =
        manufacturers::find_by_name(name).ok_or_else(|| SpdError::NotFound(name.to_string()))?;
    Ok([with_odd_parity(entry.bank - 1), with_odd_parity(entry.id)])
}

pub fn module_manufacturer(image: &SpdImage) -> Manufacturer {
    Manufacturer::decode([image[MODULE_MANUFACTURER_ID], image[MODULE_MANUFACTURER_ID + 1]])
}

pub fn dram_manufacturer(image: &SpdImage) -> Manufacturer {
    Manufacturer::decode([image[DRAM_MANUFACTURER_ID], image[DRAM_MANUFACTURER_ID + 1]])
}

pub fn write_module_manufacturer(image: &mut SpdImage, name: &str) -> SpdResult<()> {
    let bytes = encode_manufacturer(name)?;
    image[MODULE_MANUFACTURER_ID..MODULE_MANUFACTURER_ID + 2].copy_from_slice(&bytes);
    Ok(())
}

pub fn write_dram_manufacturer(image: &mut SpdImage, name: &str) -> SpdResult<()> {
    let bytes = encode_manufacturer(name)?;
    image[DRAM_MANUFACTURER_ID..DRAM_MANUFACTURER_ID + 2].copy_from_slice(&bytes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samsung_and_micron_bytes() {
        assert_eq!(encode_manufacturer("Samsung"), Ok([0x80, 0xCE]));
        assert_eq!(encode_manufacturer("Micron"), Ok([0x80, 0x2C]));
        assert_eq!(
            encode_manufacturer("Acme"),
            Err(SpdError::NotFound("Acme".to_string()))
        );
    }

    #[test]
    fn unknown_code_keeps_raw_bytes() {
        let m = Manufacturer::decode([0x7F, 0x7F]);
        assert!(!m.is_known());
        assert_eq!(m.bank, 128);
        assert_eq!(m.to_string(), "Unknown (0x7F7F)");
    }

    #[test]
    fn bank_key_beats_id_fallback() {
        let toshiba = Manufacturer::decode([0x80, 0x98]);
        assert_eq!(toshiba.name, Some("Toshiba"));
        let kingston = Manufacturer::decode([0x01, 0x98]);
        assert_eq!(kingston.name, Some("Kingston"));
        assert!(kingston.bank_resolved);
        let collided = Manufacturer::decode([0x02, 0x98]);
        assert_eq!(collided.name, None);
        let misbanked = Manufacturer::decode([0x80, 0x45]);
        assert_eq!(misbanked.name, Some("SanDisk"));
        assert!(!misbanked.bank_resolved);
    }
}
