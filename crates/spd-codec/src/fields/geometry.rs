//! Module identity and geometry: memory/module type, density, ranks,
//! device width, addressing, bank topology, bus width, package, voltage.

use std::fmt;

use serde::Serialize;

use crate::constants::*;
use crate::error::{SpdError, SpdResult};
use crate::image::SpdImage;

// ── Memory type (byte 2) ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum MemoryType {
    Ddr3,
    Ddr4,
    Ddr4E,
    Lpddr3,
    Lpddr4,
    Ddr5,
    Unknown(u8),
}

impl MemoryType {
    pub fn from_code(code: u8) -> MemoryType {
        match code {
            DRAM_TYPE_DDR3 => MemoryType::Ddr3,
            DRAM_TYPE_DDR4 => MemoryType::Ddr4,
            DRAM_TYPE_DDR4E => MemoryType::Ddr4E,
            DRAM_TYPE_LPDDR3 => MemoryType::Lpddr3,
            DRAM_TYPE_LPDDR4 => MemoryType::Lpddr4,
            DRAM_TYPE_DDR5 => MemoryType::Ddr5,
            other => MemoryType::Unknown(other),
        }
    }
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryType::Ddr3 => write!(f, "DDR3"),
            MemoryType::Ddr4 => write!(f, "DDR4"),
            MemoryType::Ddr4E => write!(f, "DDR4E"),
            MemoryType::Lpddr3 => write!(f, "LPDDR3"),
            MemoryType::Lpddr4 => write!(f, "LPDDR4"),
            MemoryType::Ddr5 => write!(f, "DDR5"),
            MemoryType::Unknown(code) => write!(f, "Unknown (0x{code:02X})"),
        }
    }
}

impl From<MemoryType> for String {
    fn from(value: MemoryType) -> Self {
        value.to_string()
    }
}

// ── Module type (byte 3, bits [3:0]) ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum ModuleType {
    Rdimm,
    Udimm,
    SoDimm,
    Lrdimm,
    MiniRdimm,
    MiniUdimm,
    SoRdimm72,
    SoUdimm72,
    SoDimm16,
    SoDimm32,
    Unknown(u8),
}

const MODULE_TYPES: [(u8, ModuleType, &str); 10] = [
    (0x01, ModuleType::Rdimm, "RDIMM"),
    (0x02, ModuleType::Udimm, "UDIMM"),
    (0x03, ModuleType::SoDimm, "SO-DIMM"),
    (0x04, ModuleType::Lrdimm, "LRDIMM"),
    (0x05, ModuleType::MiniRdimm, "Mini-RDIMM"),
    (0x06, ModuleType::MiniUdimm, "Mini-UDIMM"),
    (0x08, ModuleType::SoRdimm72, "72b-SO-RDIMM"),
    (0x09, ModuleType::SoUdimm72, "72b-SO-UDIMM"),
    (0x0C, ModuleType::SoDimm16, "16b-SO-DIMM"),
    (0x0D, ModuleType::SoDimm32, "32b-SO-DIMM"),
];

impl ModuleType {
    pub fn from_code(code: u8) -> ModuleType {
        let code = code & 0x0F;
        MODULE_TYPES
            .iter()
            .find(|(c, _, _)| *c == code)
            .map(|(_, t, _)| *t)
            .unwrap_or(ModuleType::Unknown(code))
    }

    pub fn code(self) -> Option<u8> {
        MODULE_TYPES
            .iter()
            .find(|(_, t, _)| *t == self)
            .map(|(c, _, _)| *c)
    }

    /// Case-insensitive lookup by display name.
    pub fn from_name(name: &str) -> Option<ModuleType> {
        MODULE_TYPES
            .iter()
            .find(|(_, _, n)| n.eq_ignore_ascii_case(name.trim()))
            .map(|(_, t, _)| *t)
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        MODULE_TYPES.iter().map(|(_, _, n)| *n)
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleType::Unknown(code) => write!(f, "Unknown (0x{code:02X})"),
            known => {
                let name = MODULE_TYPES
                    .iter()
                    .find(|(_, t, _)| t == known)
                    .map(|(_, _, n)| *n)
                    .unwrap_or("Unknown");
                f.write_str(name)
            }
        }
    }
}

impl From<ModuleType> for String {
    fn from(value: ModuleType) -> Self {
        value.to_string()
    }
}

/// Writes the base module type nibble, keeping the hybrid bits [7:4].
pub fn write_module_type(image: &mut SpdImage, name: &str) -> SpdResult<()> {
    let code = ModuleType::from_name(name)
        .and_then(ModuleType::code)
        .ok_or_else(|| SpdError::invalid("module type", name, "not a DDR4 module type"))?;
    image[MODULE_TYPE] = (image[MODULE_TYPE] & 0xF0) | code;
    Ok(())
}

// ── SPD header (bytes 0, 1, 17) ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpdHeader {
    /// Bytes used by the SPD device, `None` for reserved codes.
    pub bytes_used: Option<u16>,
    /// Total SPD device size, `None` for reserved codes.
    pub bytes_total: Option<u16>,
    /// Encoding level and additions level, e.g. `"1.1"`.
    pub revision: String,
    /// Both timebase selectors are the standard 125 ps / 1 ps.
    pub standard_timebases: bool,
}

impl SpdHeader {
    pub fn decode(image: &SpdImage) -> SpdHeader {
        let used = image[BYTES_USED];
        let bytes_used = match used & 0x0F {
            0b0001 => Some(128),
            0b0010 => Some(256),
            0b0011 => Some(384),
            0b0100 => Some(512),
            _ => None,
        };
        let bytes_total = match (used >> 4) & 0x07 {
            0b001 => Some(256),
            0b010 => Some(512),
            _ => None,
        };
        let revision = image[REVISION];
        SpdHeader {
            bytes_used,
            bytes_total,
            revision: format!("{}.{}", revision >> 4, revision & 0x0F),
            standard_timebases: image[TIMEBASES] & 0x0F == 0,
        }
    }
}

// ── Capacity (bytes 4, 6, 12, 13) ─────────────────────────────────────────

/// Per-die density in megabits for byte 4 bits [3:0].
pub fn density_mbit(code: u8) -> Option<u32> {
    match code & 0x0F {
        0b0000 => Some(256),
        0b0001 => Some(512),
        0b0010 => Some(1024),
        0b0011 => Some(2 * 1024),
        0b0100 => Some(4 * 1024),
        0b0101 => Some(8 * 1024),
        0b0110 => Some(16 * 1024),
        0b0111 => Some(32 * 1024),
        0b1000 => Some(12 * 1024),
        0b1001 => Some(24 * 1024),
        _ => None,
    }
}

/// SDRAM device width for byte 12 bits [2:0].
pub fn device_width(code: u8) -> Option<u8> {
    match code & 0x07 {
        0b000 => Some(4),
        0b001 => Some(8),
        0b010 => Some(16),
        0b011 => Some(32),
        _ => None,
    }
}

/// Primary bus width for byte 13 bits [2:0]: `8 << code`.
pub fn primary_bus_width(code: u8) -> Option<u16> {
    match code & 0x07 {
        code @ 0..=3 => Some(8 << code),
        _ => None,
    }
}

/// Total module capacity in megabytes:
/// `density × (bus_width / device_width) × ranks × dies / 8`.
pub fn total_capacity_mb(
    density_mbit: u32,
    bus_width: u16,
    device_width: u8,
    ranks: u8,
    dies: u8,
) -> SpdResult<u64> {
    if device_width == 0 {
        return Err(SpdError::out_of_range(
            "SDRAM device width",
            "width resolves to 0 bits",
        ));
    }
    let devices_per_rank = u64::from(bus_width) / u64::from(device_width);
    if devices_per_rank == 0 {
        return Err(SpdError::out_of_range(
            "primary bus width",
            format!("{bus_width}-bit bus is narrower than an x{device_width} device"),
        ));
    }
    Ok(u64::from(density_mbit) * devices_per_rank * u64::from(ranks) * u64::from(dies) / 8)
}

/// `"16 GB"`, `"1.5 GB"`, or `"512 MB"`.
pub fn format_capacity(mb: u64) -> String {
    if mb >= 1024 {
        if mb % 1024 == 0 {
            format!("{} GB", mb / 1024)
        } else {
            format!("{:.1} GB", mb as f64 / 1024.0)
        }
    } else {
        format!("{mb} MB")
    }
}

/// Package layout from byte 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Package {
    pub monolithic: bool,
    /// Dies per package; always 1 for monolithic packages.
    pub die_count: u8,
    /// Non-monolithic with 3DS signal loading.
    pub is_3ds: bool,
}

impl Package {
    pub fn decode(byte: u8) -> Package {
        let monolithic = byte & 0x80 == 0;
        let die_count = if monolithic {
            1
        } else {
            ((byte >> 4) & 0x07) + 1
        };
        Package {
            monolithic,
            die_count,
            is_3ds: !monolithic && byte & 0x03 == 0b10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Capacity {
    pub density_mbit: Option<u32>,
    pub density_per_die_gb: Option<f64>,
    pub ranks: u8,
    pub device_width: Option<u8>,
    pub bus_width: Option<u16>,
    pub package: Package,
    pub total_mb: Option<u64>,
    pub total_capacity_gb: Option<f64>,
    /// Display form, `"Unknown"` when any input is unresolved.
    pub capacity: String,
    /// `"{ranks}Rx{width}"`.
    pub organization: String,
}

impl Capacity {
    pub fn decode(image: &SpdImage) -> Capacity {
        let density = density_mbit(image[DENSITY_BANKS]);
        let org = image[MODULE_ORG];
        let width = device_width(org);
        let ranks = ((org >> 3) & 0x07) + 1;
        let bus = primary_bus_width(image[BUS_WIDTH]);
        let package = Package::decode(image[PACKAGE_TYPE]);

        let total_mb = match (density, bus, width) {
            (Some(d), Some(b), Some(w)) => {
                total_capacity_mb(d, b, w, ranks, package.die_count).ok()
            }
            _ => None,
        };
        let organization = match width {
            Some(w) => format!("{ranks}Rx{w}"),
            None => format!("{ranks}Rx?"),
        };

        Capacity {
            density_mbit: density,
            density_per_die_gb: density.map(|d| f64::from(d) / 1024.0),
            ranks,
            device_width: width,
            bus_width: bus,
            package,
            total_mb,
            total_capacity_gb: total_mb.map(|mb| mb as f64 / 1024.0),
            capacity: total_mb
                .map(format_capacity)
                .unwrap_or_else(|| "Unknown".to_string()),
            organization,
        }
    }
}

pub fn write_density(image: &mut SpdImage, mbit: u32) -> SpdResult<()> {
    let code = (0u8..=0b1001)
        .find(|&c| density_mbit(c) == Some(mbit))
        .ok_or_else(|| {
            SpdError::out_of_range("SDRAM density", format!("{mbit} Mb is not a DDR4 density"))
        })?;
    image[DENSITY_BANKS] = (image[DENSITY_BANKS] & 0xF0) | code;
    Ok(())
}

pub fn write_organization(image: &mut SpdImage, ranks: u8, width: u8) -> SpdResult<()> {
    if !(1..=8).contains(&ranks) {
        return Err(SpdError::out_of_range(
            "package ranks",
            format!("{ranks} is outside 1..=8"),
        ));
    }
    let code = (0u8..4).find(|&c| device_width(c) == Some(width)).ok_or_else(|| {
        SpdError::out_of_range("SDRAM device width", format!("x{width} is not a DDR4 width"))
    })?;
    image[MODULE_ORG] = (image[MODULE_ORG] & 0xC0) | ((ranks - 1) << 3) | code;
    Ok(())
}

/// Writes the package byte. `die_count == 1` selects a monolithic package.
pub fn write_package(image: &mut SpdImage, die_count: u8, is_3ds: bool) -> SpdResult<()> {
    if !(1..=8).contains(&die_count) {
        return Err(SpdError::out_of_range(
            "die count",
            format!("{die_count} is outside 1..=8"),
        ));
    }
    let byte = &mut image[PACKAGE_TYPE];
    if die_count == 1 && !is_3ds {
        *byte &= 0x0C;
    } else {
        let loading = if is_3ds { 0b10 } else { 0b01 };
        *byte = 0x80 | ((die_count - 1) << 4) | (*byte & 0x0C) | loading;
    }
    Ok(())
}

// ── Addressing (byte 5) ───────────────────────────────────────────────────

pub fn row_bits(code: u8) -> Option<u8> {
    match (code >> 3) & 0x07 {
        c @ 0..=6 => Some(12 + c),
        _ => None,
    }
}

pub fn col_bits(code: u8) -> Option<u8> {
    match code & 0x07 {
        c @ 0..=3 => Some(9 + c),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Addressing {
    pub row_bits: Option<u8>,
    pub col_bits: Option<u8>,
    /// `2^col_bits × device_width / 8` bytes.
    pub page_size_bytes: Option<u32>,
}

impl Addressing {
    pub fn decode(image: &SpdImage) -> Addressing {
        let byte = image[ADDRESSING];
        let col = col_bits(byte);
        let width = device_width(image[MODULE_ORG]);
        Addressing {
            row_bits: row_bits(byte),
            col_bits: col,
            page_size_bytes: match (col, width) {
                (Some(c), Some(w)) => Some((1u32 << c) * u32::from(w) / 8),
                _ => None,
            },
        }
    }
}

pub fn write_addressing(image: &mut SpdImage, rows: u8, cols: u8) -> SpdResult<()> {
    if !(12..=18).contains(&rows) {
        return Err(SpdError::out_of_range("row address bits", format!("{rows} is outside 12..=18")));
    }
    if !(9..=12).contains(&cols) {
        return Err(SpdError::out_of_range("column address bits", format!("{cols} is outside 9..=12")));
    }
    image[ADDRESSING] = (image[ADDRESSING] & 0xC0) | ((rows - 12) << 3) | (cols - 9);
    Ok(())
}

// ── Bank topology (byte 4, bits [7:6]) ────────────────────────────────────

/// Banks in every DDR4 bank group.
pub const BANKS_PER_GROUP: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BankTopology {
    pub bank_groups: u8,
    pub banks_per_group: u8,
    pub total_banks: u8,
}

impl BankTopology {
    /// Code `00` selects four bank groups; any other code selects two.
    pub fn decode(image: &SpdImage) -> BankTopology {
        let bank_groups = if (image[DENSITY_BANKS] >> 6) & 0x03 == 0 {
            4
        } else {
            2
        };
        BankTopology {
            bank_groups,
            banks_per_group: BANKS_PER_GROUP,
            total_banks: bank_groups * BANKS_PER_GROUP,
        }
    }
}

pub fn write_bank_groups(image: &mut SpdImage, groups: u8) -> SpdResult<()> {
    let code = match groups {
        4 => 0b00,
        2 => 0b01,
        other => {
            return Err(SpdError::out_of_range(
                "bank groups",
                format!("{other} is not 2 or 4"),
            ))
        }
    };
    image[DENSITY_BANKS] = (image[DENSITY_BANKS] & 0x3F) | (code << 6);
    Ok(())
}

// ── Bus width and ECC (byte 13) ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BusWidth {
    pub primary_bits: Option<u16>,
    /// 0 or 8; reserved codes read as 0.
    pub extension_bits: u8,
    pub has_ecc: bool,
}

impl BusWidth {
    pub fn decode(image: &SpdImage) -> BusWidth {
        let byte = image[BUS_WIDTH];
        let extension_bits = match (byte >> 3) & 0x03 {
            0b01 => 8,
            _ => 0,
        };
        BusWidth {
            primary_bits: primary_bus_width(byte),
            extension_bits,
            has_ecc: extension_bits > 0,
        }
    }
}

pub fn write_bus_width(image: &mut SpdImage, primary_bits: u16, ecc: bool) -> SpdResult<()> {
    let code = (0u8..4)
        .find(|&c| primary_bus_width(c) == Some(primary_bits))
        .ok_or_else(|| {
            SpdError::out_of_range("primary bus width", format!("{primary_bits} bits is not 8/16/32/64"))
        })?;
    let ext = if ecc { 0b01 } else { 0b00 };
    image[BUS_WIDTH] = (image[BUS_WIDTH] & 0xE0) | (ext << 3) | code;
    Ok(())
}

// ── Voltage and thermal sensor (bytes 11, 14) ─────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Voltage {
    pub nominal_mv: u16,
    pub operable: bool,
    pub endurant: bool,
}

impl Voltage {
    pub fn decode(image: &SpdImage) -> Voltage {
        let byte = image[VOLTAGE];
        Voltage {
            nominal_mv: 1200,
            operable: byte & 0x01 != 0,
            endurant: byte & 0x02 != 0,
        }
    }
}

pub fn has_thermal_sensor(image: &SpdImage) -> bool {
    image[THERMAL_SENSOR] & 0x80 != 0
}

pub fn write_thermal_sensor(image: &mut SpdImage, present: bool) {
    if present {
        image[THERMAL_SENSOR] |= 0x80;
    } else {
        image[THERMAL_SENSOR] &= 0x7F;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn density_table_includes_non_power_of_two() {
        assert_eq!(density_mbit(0b1000), Some(12 * 1024));
        assert_eq!(density_mbit(0b1001), Some(24 * 1024));
        assert_eq!(density_mbit(0b1010), None);
        assert_eq!(density_mbit(0xF5), Some(8 * 1024));
    }

    #[test]
    fn bank_groups_from_top_bits() {
        let mut image = [0u8; 512];
        assert_eq!(BankTopology::decode(&image).total_banks, 16);
        image[DENSITY_BANKS] = 0b1000_0101;
        let banks = BankTopology::decode(&image);
        assert_eq!((banks.bank_groups, banks.total_banks), (2, 8));
        write_bank_groups(&mut image, 4).unwrap();
        assert_eq!(image[DENSITY_BANKS], 0b0000_0101);
        assert!(write_bank_groups(&mut image, 1).is_err());
    }

    #[test]
    fn zero_device_width_is_an_error() {
        assert!(total_capacity_mb(8192, 64, 0, 1, 1).is_err());
        assert_eq!(total_capacity_mb(8192, 64, 8, 1, 1), Ok(8192));
        assert_eq!(total_capacity_mb(16384, 64, 4, 2, 4), Ok(262_144));
        assert!(total_capacity_mb(8192, 8, 16, 1, 1).is_err());
    }

    #[test]
    fn capacity_formatting() {
        assert_eq!(format_capacity(16384), "16 GB");
        assert_eq!(format_capacity(1536), "1.5 GB");
        assert_eq!(format_capacity(512), "512 MB");
    }

    #[test]
    fn package_decoding() {
        let mono = Package::decode(0x00);
        assert!(mono.monolithic);
        assert_eq!(mono.die_count, 1);
        let stack = Package::decode(0b1011_0010);
        assert!(!stack.monolithic);
        assert!(stack.is_3ds);
        assert_eq!(stack.die_count, 4);
        let ddp = Package::decode(0b1001_0001);
        assert_eq!(ddp.die_count, 2);
        assert!(!ddp.is_3ds);
    }
}
