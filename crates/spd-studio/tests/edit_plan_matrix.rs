//! Edit plan matrix: TOML parsing and atomic application to a record.

use spd_studio::{summary, EditError, EditPlan};
use spd_studio_codec::crc::{crc_ok, fix_crc};
use spd_studio_codec::{SpdError, SPD_SIZE};
use spd_studio_record::{Source, SpdRecord};

fn record() -> SpdRecord {
    let mut image = [0u8; SPD_SIZE];
    image[2] = 0x0C;
    image[3] = 0x02;
    image[4] = 0x05;
    image[12] = 0x09;
    image[13] = 0x03;
    image[18] = 5;
    image[24] = 110;
    fix_crc(&mut image);
    SpdRecord::from_bytes(&image, Source::Unknown).unwrap()
}

const FULL_PLAN: &str = r#"
part_number = "F4-3200C16-8GVKB"
serial = "0xDEADBEEF"
date = "2023-W14"
manufacturer = "G.Skill"
dram_manufacturer = "Samsung"
module_type = "SO-DIMM"
cas_latencies = [16, 18, 20]
clear_xmp = [2]

[timings]
tAA = 10.0
tRCD = "not a number"
"#;

#[test]
fn full_plan_parses_and_rejects_bad_values() {
    let err = EditPlan::from_toml(FULL_PLAN).unwrap_err();
    assert!(matches!(err, EditError::Parse(_)));

    let plan = EditPlan::from_toml(&FULL_PLAN.replace("\"not a number\"", "10.0")).unwrap();
    assert_eq!(plan.part_number.as_deref(), Some("F4-3200C16-8GVKB"));
    assert_eq!(plan.timings.get("tRCD"), Some(&10.0));
    assert_eq!(plan.clear_xmp, vec![2]);
}

#[test]
fn unknown_keys_are_rejected() {
    let err = EditPlan::from_toml("part = \"X\"").unwrap_err();
    assert!(matches!(err, EditError::Parse(msg) if msg.contains("unknown field")));
    let err = EditPlan::from_toml("[[xmp]]\nprofile = 1\nspeed = 3200").unwrap_err();
    assert!(matches!(err, EditError::Parse(_)));
}

#[test]
fn applying_a_plan_updates_fields_and_crc() {
    let plan = EditPlan::from_toml(&FULL_PLAN.replace("\"not a number\"", "10.0")).unwrap();
    let mut record = record();
    let changed = plan.apply(&mut record, true).unwrap();
    assert!(changed > 0);
    assert!(crc_ok(record.image()));

    let view = record.parse().unwrap();
    assert_eq!(view.part_number, "F4-3200C16-8GVKB");
    assert_eq!(view.serial_number, "DEADBEEF");
    assert_eq!(
        view.manufacturing_date.map(|d| d.to_string()).as_deref(),
        Some("2023 Week 14")
    );
    assert_eq!(view.manufacturer.name, Some("G.Skill Intl"));
    assert_eq!(view.dram_manufacturer.name, Some("Samsung"));
    assert_eq!(view.module_type.to_string(), "SO-DIMM");
    assert_eq!(view.cas_latencies, vec![16, 18, 20]);
    assert_eq!(view.cl(), 16);
    assert_eq!(view.timing_string, "CL16-16-0-0");
}

#[test]
fn keep_crc_leaves_checksums_stale() {
    let plan = EditPlan {
        part_number: Some("NEW".into()),
        bytes: [("0x12".to_string(), 6u8)].into_iter().collect(),
        ..EditPlan::default()
    };
    let mut record = record();
    plan.apply(&mut record, false).unwrap();
    assert!(!crc_ok(record.image()));
    assert_eq!(record.get_byte(0x12), Ok(6));
    assert_eq!(record.parse().unwrap().speed_grade, 2666);
}

#[test]
fn xmp_tables_are_written() {
    let plan = EditPlan::from_toml(
        r#"
[[xmp]]
profile = 1
frequency = 3600
voltage = 1.35
cl = 18
trcd = 22
trp = 22
tras = 42
"#,
    )
    .unwrap();
    let mut record = record();
    plan.apply(&mut record, true).unwrap();
    let view = record.parse().unwrap();
    assert!(view.xmp.supported);
    assert_eq!(view.xmp.profiles[0].frequency, 3600);
    assert_eq!(view.xmp.profiles[0].cl, 18);
    assert!(summary(&view).contains("XMP:          1 profile(s)"));
}

#[test]
fn resolution_errors_leave_record_untouched() {
    let cases: &[(&str, fn(&EditError) -> bool)] = &[
        ("[timings]\ntXYZ = 1.0", |e| matches!(e, EditError::UnknownTiming(n) if n == "tXYZ")),
        ("clear_xmp = [3]", |e| matches!(e, EditError::BadProfile(3))),
        ("[bytes]\n\"0x200\" = 1", |e| {
            matches!(e, EditError::Spd(SpdError::OutOfRange { .. }))
        }),
        ("[bytes]\n\"zz\" = 1", |e| matches!(e, EditError::BadAssignment(_))),
        ("manufacturer = \"Nobody\"", |e| {
            matches!(e, EditError::Spd(SpdError::NotFound(_)))
        }),
        ("date = \"2000\"", |e| {
            matches!(e, EditError::Spd(SpdError::OutOfRange { .. } | SpdError::InvalidEncoding { .. }))
        }),
        ("serial = \"123456789\"", |e| {
            matches!(e, EditError::Spd(SpdError::InvalidEncoding { .. }))
        }),
    ];
    for (text, check) in cases {
        let plan = EditPlan::from_toml(&format!("part_number = \"CHANGED\"\n{text}")).unwrap();
        let mut record = record();
        let before = *record.image();
        let err = plan.apply(&mut record, true).unwrap_err();
        assert!(check(&err), "{text}: {err:?}");
        assert_eq!(record.image(), &before, "{text}");
        assert!(!record.is_modified(), "{text}");
    }
}

#[test]
fn summary_lists_key_fields() {
    let view = record().parse().unwrap();
    let text = summary(&view);
    assert!(text.starts_with("DDR4 UDIMM 16 GB 2Rx8 DDR4-3200 CL22-"));
    assert!(text.contains("Date:         Unknown"));
    assert!(text.contains("XMP:          not present"));
    assert!(text.ends_with("CRC:          OK"));
}
