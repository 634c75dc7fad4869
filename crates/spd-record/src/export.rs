//! Structured JSON export and plain-text report of a record.
//!
//! Both are projections of the current image; nothing here is read back.

use serde_json::{json, Map, Value};
use spd_studio_codec::crc::CrcCheck;
use spd_studio_codec::fields::Package;
use spd_studio_codec::{ParsedView, TimingField, XmpInfo};

use crate::record::SpdRecord;

const RULE_WIDTH: usize = 50;

/// `{source, raw_data, parsed, modifications}`.
///
/// `parsed` holds the full decoded view, or `{"error": ...}` when the image
/// is not DDR4. `modifications` is keyed by decimal offset.
pub fn to_json(record: &SpdRecord) -> Value {
    let parsed = match record.parse() {
        Ok(view) => serde_json::to_value(&view)
            .unwrap_or_else(|err| json!({ "error": err.to_string() })),
        Err(err) => json!({ "error": err.to_string() }),
    };
    let modifications: Map<String, Value> = record
        .modifications()
        .into_iter()
        .map(|(offset, (original, current))| {
            (
                offset.to_string(),
                json!({ "original": original, "current": current }),
            )
        })
        .collect();
    json!({
        "source": record.source().to_string(),
        "raw_data": record.image().to_vec(),
        "parsed": parsed,
        "modifications": modifications,
    })
}

struct Report {
    out: String,
}

impl Report {
    fn new() -> Self {
        Report { out: String::new() }
    }

    fn line(&mut self, text: impl AsRef<str>) {
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn field(&mut self, label: &str, value: impl std::fmt::Display) {
        self.line(format!("{label}: {value}"));
    }

    fn section(&mut self, title: &str) {
        self.line("");
        self.line("-".repeat(RULE_WIDTH));
        self.line(title);
        self.line("-".repeat(RULE_WIDTH));
    }

    fn finish(mut self) -> String {
        self.line("");
        self.line("=".repeat(RULE_WIDTH));
        self.out
    }
}

/// Plain-text report grouped into sections, ending with the modification
/// list when the image differs from its baseline.
pub fn text_report(record: &SpdRecord) -> String {
    let mut r = Report::new();
    r.line("=".repeat(RULE_WIDTH));
    r.line("SPD Report");
    r.line("=".repeat(RULE_WIDTH));
    r.field("Source", record.source());

    match record.parse() {
        Ok(view) => write_view(&mut r, &view),
        Err(err) => {
            r.section("Basic Information");
            r.field("Status", err);
        }
    }

    let modifications = record.modifications();
    if !modifications.is_empty() {
        r.section(&format!("Modifications ({} bytes)", modifications.len()));
        for (offset, (old, new)) in &modifications {
            r.line(format!("Offset 0x{offset:03X}: 0x{old:02X} -> 0x{new:02X}"));
        }
    }
    r.finish()
}

fn write_view(r: &mut Report, view: &ParsedView) {
    r.section("Basic Information");
    r.field("Memory Type", view.memory_type);
    r.field("Module Type", view.module_type);
    r.field("SPD Revision", &view.header.revision);
    r.field("Speed Grade", format!("DDR4-{0} ({0} MT/s)", view.speed_grade));
    r.field("Timings", &view.timing_string);
    r.field(
        "Voltage",
        format!("{:.2} V", f64::from(view.voltage.nominal_mv) / 1000.0),
    );
    r.field("Thermal Sensor", yes_no(view.thermal_sensor));

    r.section("Capacity & Organization");
    let cap = &view.capacity;
    r.field("Capacity", &cap.capacity);
    r.field("Organization", &cap.organization);
    r.field(
        "Density",
        cap.density_mbit
            .map(|d| format!("{} Gb per die", f64::from(d) / 1024.0))
            .unwrap_or_else(|| "Unknown".to_string()),
    );
    r.field("Package", package_label(&cap.package));
    r.field(
        "Banks",
        format!(
            "{} groups x {} banks ({} total)",
            view.banks.bank_groups, view.banks.banks_per_group, view.banks.total_banks
        ),
    );
    r.field(
        "Bus Width",
        match view.bus.primary_bits {
            Some(bits) if view.bus.has_ecc => {
                format!("{bits}-bit + {}-bit ECC", view.bus.extension_bits)
            }
            Some(bits) => format!("{bits}-bit"),
            None => "Unknown".to_string(),
        },
    );
    r.field("Die", format!("{} ({})", view.die_description, view.die_note));

    r.section("Manufacturer");
    r.field("Module Manufacturer", &view.manufacturer);
    r.field("DRAM Manufacturer", &view.dram_manufacturer);
    r.field("Part Number", or_unknown(&view.part_number));
    r.field("Serial Number", &view.serial_number);
    r.field(
        "Manufacturing Date",
        view.manufacturing_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "Unknown".to_string()),
    );
    r.field("Module Revision", format!("0x{:02X}", view.module_revision));

    r.section("Timings");
    for field in TimingField::ALL {
        r.field(field.name(), format!("{:.3} ns", view.timings.get(field)));
    }
    r.field("CL", view.cl());
    let cls: Vec<String> = view.cas_latencies.iter().map(u32::to_string).collect();
    r.field("Supported CL", or_unknown(&cls.join(", ")));

    r.section("XMP");
    write_xmp(r, &view.xmp);

    r.section("Integrity");
    for check in &view.crc {
        r.field(&crc_label(check), crc_status(check));
    }
}

fn write_xmp(r: &mut Report, xmp: &XmpInfo) {
    r.field("Supported", yes_no(xmp.supported));
    if !xmp.supported {
        return;
    }
    if let Some(version) = &xmp.version {
        r.field("Version", version);
    }
    if xmp.profiles.is_empty() {
        r.line("No profiles");
    }
    for p in &xmp.profiles {
        r.field(
            &format!("Profile {}", p.slot),
            format!(
                "DDR4-{} {:.3} V CL{}-{}-{}-{}{}",
                p.frequency,
                p.voltage,
                p.cl,
                p.trcd,
                p.trp,
                p.tras,
                if p.enabled { "" } else { " (disabled)" }
            ),
        );
    }
}

fn package_label(package: &Package) -> String {
    match (package.monolithic, package.is_3ds) {
        (true, _) => "Monolithic".to_string(),
        (false, true) => format!("3DS, {} dies", package.die_count),
        (false, false) => format!("Multi-die, {} dies", package.die_count),
    }
}

fn crc_label(check: &CrcCheck) -> String {
    let range = check.section.covered();
    format!("CRC {}-{}", range.start, range.end - 1)
}

fn crc_status(check: &CrcCheck) -> String {
    if check.ok {
        format!("0x{:04X} OK", check.stored)
    } else {
        format!(
            "0x{:04X} MISMATCH (computed 0x{:04X})",
            check.stored, check.computed
        )
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn or_unknown(text: &str) -> &str {
    if text.is_empty() {
        "Unknown"
    } else {
        text
    }
}
