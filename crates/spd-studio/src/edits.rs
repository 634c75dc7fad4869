//! Field-level edit plans, loaded from TOML or assembled from flags.

use std::collections::BTreeMap;

use serde::Deserialize;
use spd_studio_codec::crc::fix_crc;
use spd_studio_codec::fields::geometry::write_module_type;
use spd_studio_codec::fields::identity::{
    parse_manufacturing_date, write_manufacturing_date, write_part_number, write_serial_number,
};
use spd_studio_codec::fields::manufacturer::{write_dram_manufacturer, write_module_manufacturer};
use spd_studio_codec::timing::{write_cas_latencies, write_timing_ns};
use spd_studio_codec::xmp::{clear_xmp_profile, write_xmp_profile};
use spd_studio_codec::{check_range, SpdError, TimingField, XmpProfileSpec, XmpSlot};
use spd_studio_record::SpdRecord;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("invalid edit file: {0}")]
    Parse(String),
    #[error("unknown timing parameter {0:?}")]
    UnknownTiming(String),
    #[error("XMP profile must be 1 or 2, got {0}")]
    BadProfile(u8),
    #[error("invalid byte assignment {0:?} (expected OFFSET=VALUE)")]
    BadAssignment(String),
    #[error(transparent)]
    Spd(#[from] SpdError),
}

/// One XMP profile to write. Field names match the `[[xmp]]` table.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct XmpEdit {
    pub profile: u8,
    /// MT/s.
    pub frequency: u32,
    pub voltage: f64,
    pub cl: u32,
    pub trcd: u32,
    pub trp: u32,
    pub tras: u32,
}

impl XmpEdit {
    fn resolve(&self) -> Result<(XmpSlot, XmpProfileSpec), EditError> {
        let slot = XmpSlot::from_number(self.profile)
            .ok_or(EditError::BadProfile(self.profile))?;
        let spec = XmpProfileSpec {
            frequency: self.frequency,
            voltage: self.voltage,
            cl: self.cl,
            trcd: self.trcd,
            trp: self.trp,
            tras: self.tras,
        };
        Ok((slot, spec))
    }
}

/// Every edit `spd-tool edit` can apply.
///
/// ```toml
/// part_number = "F4-3200C16-8GVKB"
/// manufacturer = "G.Skill"
/// date = "2023-W14"
///
/// [timings]
/// tAA = 13.75
///
/// [[xmp]]
/// profile = 1
/// frequency = 3600
/// voltage = 1.35
/// cl = 18
/// trcd = 22
/// trp = 22
/// tras = 42
///
/// [bytes]
/// "0x140" = 0x80
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditPlan {
    pub part_number: Option<String>,
    pub serial: Option<String>,
    pub date: Option<String>,
    pub manufacturer: Option<String>,
    pub dram_manufacturer: Option<String>,
    pub module_type: Option<String>,
    /// Timing name (`tAA`, `tRFC1`, ...) to nanoseconds.
    #[serde(default)]
    pub timings: BTreeMap<String, f64>,
    pub cas_latencies: Option<Vec<u32>>,
    #[serde(default)]
    pub clear_xmp: Vec<u8>,
    #[serde(default)]
    pub xmp: Vec<XmpEdit>,
    /// Raw pokes, applied last. Keys are decimal or `0x` offsets.
    #[serde(default)]
    pub bytes: BTreeMap<String, u8>,
}

/// A plan with names and offsets resolved, ready to run against an image.
struct Resolved {
    timings: Vec<(TimingField, f64)>,
    clear_xmp: Vec<XmpSlot>,
    xmp: Vec<(XmpSlot, XmpProfileSpec)>,
    bytes: Vec<(usize, u8)>,
}

impl EditPlan {
    pub fn from_toml(text: &str) -> Result<Self, EditError> {
        toml::from_str(text).map_err(|err| EditError::Parse(err.to_string()))
    }

    /// Overlays every field set in `other` on top of `self`.
    pub fn merge(&mut self, other: EditPlan) {
        overlay(&mut self.part_number, other.part_number);
        overlay(&mut self.serial, other.serial);
        overlay(&mut self.date, other.date);
        overlay(&mut self.manufacturer, other.manufacturer);
        overlay(&mut self.dram_manufacturer, other.dram_manufacturer);
        overlay(&mut self.module_type, other.module_type);
        overlay(&mut self.cas_latencies, other.cas_latencies);
        self.timings.extend(other.timings);
        self.clear_xmp.extend(other.clear_xmp);
        self.xmp.extend(other.xmp);
        self.bytes.extend(other.bytes);
    }

    pub fn is_empty(&self) -> bool {
        *self == EditPlan::default()
    }

    fn resolve(&self) -> Result<Resolved, EditError> {
        let timings: Vec<(TimingField, f64)> = self
            .timings
            .iter()
            .map(|(name, &ns)| {
                TimingField::from_name(name)
                    .map(|field| (field, ns))
                    .ok_or_else(|| EditError::UnknownTiming(name.clone()))
            })
            .collect::<Result<_, _>>()?;
        let clear_xmp: Vec<XmpSlot> = self
            .clear_xmp
            .iter()
            .map(|&n| XmpSlot::from_number(n).ok_or(EditError::BadProfile(n)))
            .collect::<Result<_, _>>()?;
        let xmp: Vec<(XmpSlot, XmpProfileSpec)> = self
            .xmp
            .iter()
            .map(XmpEdit::resolve)
            .collect::<Result<_, _>>()?;
        let bytes: Vec<(usize, u8)> = self
            .bytes
            .iter()
            .map(|(key, &value)| {
                let offset = parse_number(key)
                    .ok_or_else(|| EditError::BadAssignment(format!("{key}={value}")))?;
                check_range(offset, 1)?;
                Ok((offset, value))
            })
            .collect::<Result<_, EditError>>()?;
        Ok(Resolved {
            timings,
            clear_xmp,
            xmp,
            bytes,
        })
    }

    /// Applies the plan as one atomic edit. With `update_crc` both CRC
    /// fields are recomputed afterwards. Returns the number of bytes changed.
    pub fn apply(&self, record: &mut SpdRecord, update_crc: bool) -> Result<usize, EditError> {
        let plan = self.resolve()?;
        let changed = record.edit(|image| {
            if let Some(name) = &self.module_type {
                write_module_type(image, name)?;
            }
            if let Some(name) = &self.manufacturer {
                write_module_manufacturer(image, name)?;
            }
            if let Some(name) = &self.dram_manufacturer {
                write_dram_manufacturer(image, name)?;
            }
            if let Some(text) = &self.part_number {
                write_part_number(image, text)?;
            }
            if let Some(text) = &self.serial {
                write_serial_number(image, text)?;
            }
            if let Some(text) = &self.date {
                write_manufacturing_date(image, parse_manufacturing_date(text)?)?;
            }
            for &(field, ns) in &plan.timings {
                write_timing_ns(image, field, ns)?;
            }
            if let Some(cls) = &self.cas_latencies {
                write_cas_latencies(image, cls)?;
            }
            for &slot in &plan.clear_xmp {
                clear_xmp_profile(image, slot);
            }
            for (slot, spec) in &plan.xmp {
                write_xmp_profile(image, *slot, spec)?;
            }
            for &(offset, value) in &plan.bytes {
                image[offset] = value;
            }
            if update_crc {
                fix_crc(image);
            }
            Ok(())
        })?;
        Ok(changed)
    }
}

fn overlay<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Parses `320`, `0x140` or `0X140`.
pub fn parse_number(text: &str) -> Option<usize> {
    let text = text.trim();
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

/// Parses an `OFFSET=VALUE` pair from the command line.
pub fn parse_assignment(text: &str) -> Result<(usize, u8), EditError> {
    let bad = || EditError::BadAssignment(text.to_string());
    let (offset, value) = text.split_once('=').ok_or_else(bad)?;
    let offset = parse_number(offset).ok_or_else(bad)?;
    let value = parse_number(value)
        .and_then(|v| u8::try_from(v).ok())
        .ok_or_else(bad)?;
    check_range(offset, 1)?;
    Ok((offset, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers() {
        assert_eq!(parse_number("320"), Some(320));
        assert_eq!(parse_number("0x140"), Some(320));
        assert_eq!(parse_number(" 0X1ff "), Some(511));
        assert_eq!(parse_number("0x"), None);
        assert_eq!(parse_number("x10"), None);
    }

    #[test]
    fn assignments() {
        assert_eq!(parse_assignment("0x12=5"), Ok((18, 5)));
        assert_eq!(parse_assignment("18=0xFF"), Ok((18, 255)));
        assert!(matches!(parse_assignment("18"), Err(EditError::BadAssignment(_))));
        assert!(matches!(parse_assignment("18=256"), Err(EditError::BadAssignment(_))));
        assert!(matches!(
            parse_assignment("512=1"),
            Err(EditError::Spd(SpdError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn merge_prefers_later_values() {
        let mut base = EditPlan {
            part_number: Some("A".into()),
            serial: Some("1".into()),
            ..EditPlan::default()
        };
        base.merge(EditPlan {
            part_number: Some("B".into()),
            ..EditPlan::default()
        });
        assert_eq!(base.part_number.as_deref(), Some("B"));
        assert_eq!(base.serial.as_deref(), Some("1"));
        assert!(!base.is_empty());
        assert!(EditPlan::default().is_empty());
    }
}
