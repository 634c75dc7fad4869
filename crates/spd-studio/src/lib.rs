//! Support library for the `spd-tool` command-line front end.
//!
//! # Overview
//!
//! - [`EditPlan`] - Field-level edits from a TOML file or flags, applied
//!   atomically through [`SpdRecord::edit`](spd_studio_record::SpdRecord::edit)
//! - [`summary`] - Short human-readable summary of a decoded image
//! - [`format_diff`] - Byte differences, one line per offset

mod edits;

use spd_studio_codec::ParsedView;
use spd_studio_record::ByteDiff;

pub use edits::{parse_assignment, parse_number, EditError, EditPlan, XmpEdit};

/// A few lines covering what a user usually wants first.
pub fn summary(view: &ParsedView) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {} {} {} DDR4-{} {}\n",
        view.memory_type,
        view.module_type,
        view.capacity.capacity,
        view.capacity.organization,
        view.speed_grade,
        view.timing_string
    ));
    out.push_str(&format!("Manufacturer: {}\n", view.manufacturer));
    out.push_str(&format!("Part Number:  {}\n", view.part_number));
    out.push_str(&format!("Serial:       {}\n", view.serial_number));
    let date = view
        .manufacturing_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    out.push_str(&format!("Date:         {date}\n"));
    out.push_str(&format!(
        "Die:          {} ({})\n",
        view.die_description, view.die_note
    ));
    let xmp = match view.xmp.profiles.len() {
        _ if !view.xmp.supported => "not present".to_string(),
        0 => "header only".to_string(),
        n => format!("{n} profile(s)"),
    };
    out.push_str(&format!("XMP:          {xmp}\n"));
    out.push_str(if view.crc_ok() {
        "CRC:          OK"
    } else {
        "CRC:          MISMATCH"
    });
    out
}

/// `Offset 0x{:03X}: 0x{:02X} -> 0x{:02X}` for every entry.
pub fn format_diff(diff: &ByteDiff) -> String {
    diff.iter()
        .map(|(offset, (left, right))| {
            format!("Offset 0x{offset:03X}: 0x{left:02X} -> 0x{right:02X}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
