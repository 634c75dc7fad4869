//! Export matrix: JSON snapshot and text report.

use spd_studio_codec::crc::fix_crc;
use spd_studio_codec::fields::identity::write_part_number;
use spd_studio_codec::fields::manufacturer::write_module_manufacturer;
use spd_studio_codec::xmp::write_xmp_profile;
use spd_studio_codec::{XmpProfileSpec, XmpSlot, SPD_SIZE};
use spd_studio_record::{text_report, to_json, Source, SpdRecord};

fn samsung_record() -> SpdRecord {
    let mut image = [0u8; SPD_SIZE];
    image[2] = 0x0C;
    image[3] = 0x02;
    image[4] = 0x05;
    image[12] = 0x09;
    image[13] = 0x03;
    image[18] = 5;
    image[24] = 110;
    write_module_manufacturer(&mut image, "Samsung").unwrap();
    write_part_number(&mut image, "M378A1K43CB2-CTD").unwrap();
    fix_crc(&mut image);
    SpdRecord::from_bytes(&image, Source::File("samsung.bin".into())).unwrap()
}

#[test]
fn json_carries_raw_parsed_and_modifications() {
    let mut record = samsung_record();
    record.set_byte(18, 6).unwrap();
    let json = to_json(&record);

    assert_eq!(json["source"], "samsung.bin");
    assert_eq!(json["raw_data"].as_array().map(Vec::len), Some(512));
    assert_eq!(json["raw_data"][18], 6);
    assert_eq!(json["parsed"]["memory_type"], "DDR4");
    assert_eq!(json["parsed"]["manufacturer"]["name"], "Samsung");
    assert_eq!(json["parsed"]["capacity"]["capacity"], "16 GB");
    assert_eq!(json["parsed"]["speed_grade"], 2666);
    assert_eq!(json["modifications"]["18"]["original"], 5);
    assert_eq!(json["modifications"]["18"]["current"], 6);

    let keys: Vec<&str> = json
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, ["source", "raw_data", "parsed", "modifications"]);
}

#[test]
fn json_reports_unsupported_images_as_error() {
    let record = SpdRecord::from_bytes(&[0u8; SPD_SIZE], Source::Device).unwrap();
    let json = to_json(&record);
    assert_eq!(json["source"], "device");
    assert!(json["parsed"]["error"]
        .as_str()
        .unwrap()
        .contains("unsupported memory type 0x00"));
    assert!(json["modifications"].as_object().unwrap().is_empty());
}

#[test]
fn report_has_every_section() {
    let report = text_report(&samsung_record());
    for heading in [
        "SPD Report",
        "Basic Information",
        "Capacity & Organization",
        "Manufacturer",
        "Timings",
        "XMP",
        "Integrity",
    ] {
        assert!(report.contains(heading), "missing {heading}\n{report}");
    }
    assert!(report.contains("Source: samsung.bin"));
    assert!(report.contains("Module Type: UDIMM"));
    assert!(report.contains("Capacity: 16 GB"));
    assert!(report.contains("Organization: 2Rx8"));
    assert!(report.contains("Module Manufacturer: Samsung"));
    assert!(report.contains("Part Number: M378A1K43CB2-CTD"));
    assert!(report.contains("Die: 8 Gb A-die (20nm) (inferred from part number; not authoritative)"));
    assert!(report.contains("tCK: 0.625 ns"));
    assert!(report.contains("CL: 22"));
    assert!(report.contains("Supported: No"));
    assert!(report.contains("CRC 0-125: "));
    assert!(!report.contains("MISMATCH"));
    assert!(!report.contains("Modifications"));
}

#[test]
fn report_lists_modifications_in_offset_order() {
    let mut record = samsung_record();
    record.set_byte(0x149, 0x41).unwrap();
    record.set_byte(0x012, 0x06).unwrap();
    let report = text_report(&record);
    let tail = report
        .split("Modifications (2 bytes)")
        .nth(1)
        .expect("modifications section");
    let first = tail.find("Offset 0x012: 0x05 -> 0x06").unwrap();
    let second = tail.find("Offset 0x149: 0x4D -> 0x41").unwrap();
    assert!(first < second);
    assert!(report.contains("MISMATCH"));
}

#[test]
fn report_shows_xmp_profiles() {
    let mut record = samsung_record();
    let spec = XmpProfileSpec {
        frequency: 3200,
        voltage: 1.35,
        cl: 16,
        trcd: 18,
        trp: 18,
        tras: 38,
    };
    record
        .edit(|image| write_xmp_profile(image, XmpSlot::Profile1, &spec))
        .unwrap();
    let report = text_report(&record);
    assert!(report.contains("Supported: Yes"));
    assert!(report.contains("Version: 2.0"));
    assert!(report.contains("Profile 1: DDR4-3200 1.350 V CL16-18-18-38"));
}

#[test]
fn report_for_unsupported_image() {
    let record = SpdRecord::from_bytes(&[0u8; SPD_SIZE], Source::Unknown).unwrap();
    let report = text_report(&record);
    assert!(report.contains("Status: unsupported memory type 0x00"));
    assert!(!report.contains("Capacity & Organization"));
}
