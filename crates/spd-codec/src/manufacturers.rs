//! JEDEC JEP106 manufacturer registry.
//!
//! Entries are keyed by `(bank, id)` where `bank` is 1-based and `id` is
//! the 7-bit code without its parity bit. Names are unique.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ManufacturerEntry {
    pub bank: u8,
    pub id: u8,
    pub name: &'static str,
    /// Short display name used in reports and CLI flags.
    pub short: &'static str,
}

macro_rules! entry {
    ($bank:expr, $id:expr, $name:expr, $short:expr) => {
        ManufacturerEntry {
            bank: $bank,
            id: $id,
            name: $name,
            short: $short,
        }
    };
}

pub static MANUFACTURERS: &[ManufacturerEntry] = &[
    // Bank 1
    entry!(1, 0x01, "AMD", "AMD"),
    entry!(1, 0x04, "Fujitsu", "Fujitsu"),
    entry!(1, 0x07, "Hitachi", "Hitachi"),
    entry!(1, 0x09, "Intel", "Intel"),
    entry!(1, 0x0C, "Elite Semiconductor Memory Technology", "ESMT"),
    entry!(1, 0x18, "Toshiba", "Toshiba"),
    entry!(1, 0x1C, "Mitsubishi", "Mitsubishi"),
    entry!(1, 0x1F, "Atmel", "Atmel"),
    entry!(1, 0x20, "STMicroelectronics", "ST"),
    entry!(1, 0x2C, "Micron Technology", "Micron"),
    entry!(1, 0x2D, "SK Hynix", "Hynix"),
    entry!(1, 0x30, "Sharp", "Sharp"),
    entry!(1, 0x3F, "Silicon Storage Technology", "SST"),
    entry!(1, 0x41, "Infineon", "Infineon"),
    entry!(1, 0x42, "Macronix", "Macronix"),
    entry!(1, 0x4E, "Samsung", "Samsung"),
    entry!(1, 0x55, "Integrated Silicon Solution", "ISSI"),
    entry!(1, 0x5A, "Winbond Electronics", "Winbond"),
    // Bank 2
    entry!(2, 0x14, "SMART Modular", "SMART"),
    entry!(2, 0x18, "Kingston", "Kingston"),
    entry!(2, 0x1C, "Eon Silicon Devices", "EON"),
    entry!(2, 0x37, "AMIC Technology", "AMIC"),
    entry!(2, 0x3A, "PNY Technologies", "PNY"),
    entry!(2, 0x45, "SanDisk", "SanDisk"),
    entry!(2, 0x4F, "Transcend Information", "Transcend"),
    entry!(2, 0x51, "Qimonda", "Qimonda"),
    entry!(2, 0x61, "Wintec Industries", "Wintec"),
    entry!(2, 0x77, "Silicon Power", "SP"),
    entry!(2, 0x7A, "Apacer Technology", "Apacer"),
    // Bank 3
    entry!(3, 0x1E, "Corsair", "Corsair"),
    entry!(3, 0x35, "SpecTek", "SpecTek"),
    entry!(3, 0x7E, "Elpida", "Elpida"),
    // Bank 4
    entry!(4, 0x03, "OCZ Technology", "OCZ"),
    entry!(4, 0x0B, "Nanya Technology", "Nanya"),
    entry!(4, 0x13, "Golden Empire (GeIL)", "GeIL"),
    entry!(4, 0x14, "Mushkin", "Mushkin"),
    entry!(4, 0x16, "Netlist", "Netlist"),
    entry!(4, 0x25, "Kingmax Semiconductor", "Kingmax"),
    entry!(4, 0x5A, "Swissbit", "Swissbit"),
    // Bank 5
    entry!(5, 0x14, "Innodisk", "Innodisk"),
    entry!(5, 0x33, "ATP Electronics", "ATP"),
    entry!(5, 0x43, "Ramaxel Technology", "Ramaxel"),
    entry!(5, 0x4B, "A-DATA Technology", "ADATA"),
    entry!(5, 0x4D, "G.Skill Intl", "G.Skill"),
    entry!(5, 0x6F, "Team Group", "Team"),
    // Bank 6
    entry!(6, 0x02, "Patriot Memory", "Patriot"),
    entry!(6, 0x1B, "Crucial Technology", "Crucial"),
    entry!(6, 0x41, "V-Color Technology", "V-Color"),
    // Bank 8
    entry!(8, 0x21, "Longsys Electronics", "Longsys"),
    // Bank 9
    entry!(9, 0x48, "UniIC Semiconductors", "UniIC"),
    entry!(9, 0x4A, "Yangtze Memory Technologies", "YMTC"),
    // Bank 11
    entry!(11, 0x11, "ChangXin Memory Technologies", "CXMT"),
];

/// Vendors most often written to consumer and server modules, in the order
/// an editor offers them.
pub static COMMON_MANUFACTURERS: &[&str] = &[
    "Samsung",
    "SK Hynix",
    "Micron Technology",
    "Crucial Technology",
    "Corsair",
    "G.Skill Intl",
    "Kingston",
    "Team Group",
    "A-DATA Technology",
    "Patriot Memory",
    "Golden Empire (GeIL)",
    "Ramaxel Technology",
    "Nanya Technology",
];

/// Registry entries for [`COMMON_MANUFACTURERS`], in list order.
pub fn common() -> impl Iterator<Item = &'static ManufacturerEntry> {
    COMMON_MANUFACTURERS
        .iter()
        .filter_map(|name| MANUFACTURERS.iter().find(|m| m.name == *name))
}

/// Exact `(bank, id)` lookup; `id` may carry its parity bit.
pub fn lookup(bank: u8, id: u8) -> Option<&'static ManufacturerEntry> {
    let id = id & 0x7F;
    MANUFACTURERS.iter().find(|m| m.bank == bank && m.id == id)
}

/// Bank-agnostic lookup that succeeds only when exactly one entry carries
/// `id`. Used as a fallback for images with a damaged continuation byte.
pub fn lookup_unique_id(id: u8) -> Option<&'static ManufacturerEntry> {
    let id = id & 0x7F;
    let mut hits = MANUFACTURERS.iter().filter(|m| m.id == id);
    match (hits.next(), hits.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}

/// Case-insensitive lookup by full or short name.
pub fn find_by_name(name: &str) -> Option<&'static ManufacturerEntry> {
    let name = name.trim();
    MANUFACTURERS
        .iter()
        .find(|m| m.name.eq_ignore_ascii_case(name))
        .or_else(|| MANUFACTURERS.iter().find(|m| m.short.eq_ignore_ascii_case(name)))
}

/// Short name for a registry name, or the name itself when unknown.
pub fn short_name(name: &str) -> &str {
    find_by_name(name).map(|m| m.short).unwrap_or(name)
}
