//! Manufacturer registry and die inference matrix.

use spd_studio_codec::die_database::{describe_die, infer_die, DieRule};
use spd_studio_codec::fields::manufacturer::encode_manufacturer;
use spd_studio_codec::fields::Manufacturer;
use spd_studio_codec::manufacturers::{common, find_by_name, lookup, MANUFACTURERS};
use spd_studio_codec::with_odd_parity;

// ---------------------------------------------------------------------------
// Registry round-trip
// ---------------------------------------------------------------------------

#[test]
fn every_registry_name_round_trips() {
    for entry in MANUFACTURERS {
        for name in [entry.name, entry.short] {
            let bytes = encode_manufacturer(name).unwrap();
            let decoded = Manufacturer::decode(bytes);
            assert_eq!(decoded.name, Some(entry.name), "{name}");
            assert!(decoded.bank_resolved, "{name}");
            assert_eq!((decoded.bank, decoded.id), (entry.bank, entry.id));
        }
    }
}

#[test]
fn encoded_bytes_carry_odd_parity() {
    for entry in MANUFACTURERS {
        let [a, b] = encode_manufacturer(entry.name).unwrap();
        assert_eq!(a.count_ones() % 2, 1, "{} bank byte 0x{a:02X}", entry.name);
        assert_eq!(b.count_ones() % 2, 1, "{} id byte 0x{b:02X}", entry.name);
        assert_eq!(with_odd_parity(a), a);
    }
}

#[test]
fn well_known_codes() {
    let cases: &[([u8; 2], &str)] = &[
        ([0x80, 0xCE], "Samsung"),
        ([0x80, 0xAD], "SK Hynix"),
        ([0x80, 0x2C], "Micron Technology"),
        ([0x01, 0x98], "Kingston"),
        ([0x02, 0x9E], "Corsair"),
        ([0x04, 0xCD], "G.Skill Intl"),
        ([0x85, 0x9B], "Crucial Technology"),
        ([0x83, 0x0B], "Nanya Technology"),
        ([0x85, 0x02], "Patriot Memory"),
        ([0x83, 0x13], "Golden Empire (GeIL)"),
        ([0x02, 0xFE], "Elpida"),
        ([0x01, 0x37], "AMIC Technology"),
    ];
    for &(bytes, name) in cases {
        assert_eq!(Manufacturer::decode(bytes).name, Some(name), "{bytes:02X?}");
    }
}

#[test]
fn samsung_by_name() {
    assert_eq!(encode_manufacturer("Samsung"), Ok([0x80, 0xCE]));
    assert_eq!(encode_manufacturer("  samsung "), Ok([0x80, 0xCE]));
    assert_eq!(find_by_name("SAMSUNG").map(|m| (m.bank, m.id)), Some((1, 0x4E)));
}

#[test]
fn module_vendors_encode_by_short_name() {
    let cases: &[(&str, [u8; 2])] = &[
        ("Patriot", [0x85, 0x02]),
        ("GeIL", [0x83, 0x13]),
        ("Mushkin", [0x83, 0x94]),
        ("Kingmax", [0x83, 0x25]),
        ("Swissbit", [0x83, 0xDA]),
        ("SpecTek", [0x02, 0xB5]),
        ("Wintec", [0x01, 0x61]),
    ];
    for &(name, bytes) in cases {
        assert_eq!(encode_manufacturer(name), Ok(bytes), "{name}");
    }
    for vendor in ["Silicon Power", "OCZ", "ESMT", "ATP", "Innodisk", "V-Color", "YMTC", "UniIC", "Longsys"] {
        assert!(encode_manufacturer(vendor).is_ok(), "{vendor}");
    }
}

#[test]
fn common_vendors_are_registered() {
    let names: Vec<&str> = common().map(|m| m.short).collect();
    assert_eq!(names.len(), 13);
    assert!(names.contains(&"Patriot"));
    assert!(names.contains(&"GeIL"));
}

#[test]
fn parity_bit_is_ignored_on_decode() {
    let with = Manufacturer::decode([0x80, 0xCE]);
    let without = Manufacturer::decode([0x00, 0x4E]);
    assert_eq!(with.name, without.name);
    assert_eq!(lookup(1, 0xCE), lookup(1, 0x4E));
}

#[test]
fn unknown_bytes_render_raw() {
    // 0x18 is shared by Toshiba and Kingston, so no bank-agnostic match.
    let m = Manufacturer::decode([0x90, 0x98]);
    assert_eq!(m.name, None);
    assert_eq!(m.to_string(), "Unknown (0x9098)");
}

// ---------------------------------------------------------------------------
// Die inference
// ---------------------------------------------------------------------------

#[test]
fn die_inference_matrix() {
    let cases: &[(&str, Option<&str>, Option<&str>)] = &[
        ("HMA81GU6DJR8N-XN", Some("SK Hynix"), None),
        ("HMA82GR7CJR8N-XN", Some("SK Hynix"), Some("C-die")),
        ("HMAA4GR7AJR8N-XN", None, Some("A-die")),
        ("HMA82GR7MFR8N-TF", Some("SK Hynix"), Some("M-die")),
        ("HMA82GR7ZFR8N-TF", Some("SK Hynix"), None),
        ("M393A2K43BB1-CTD", Some("Samsung"), Some("A-die")),
        ("M378B5273DH0-CH9", Some("Samsung"), Some("B-die")),
        ("MTA18ASF2G72PZ-2G6E1", Some("Micron Technology"), Some("Rev-A")),
        ("MTC20C2085S1EC48BA1", None, Some("Rev-C")),
        ("CMK16GX4M2B3200C16", Some("Corsair"), None),
        ("F4-3200C16-8GVKB", Some("G.Skill Intl"), None),
    ];
    for &(part, mfr, want) in cases {
        let got = infer_die(part, mfr).map(|d| d.die_type);
        assert_eq!(got, want, "{part} / {mfr:?}");
    }
}

#[test]
fn structural_rule_is_preferred() {
    let die = infer_die("HMA82GR7CJR8N-XN", None).unwrap();
    assert_eq!(die.rule, DieRule::Structural);
    assert_eq!(die.manufacturer, "SK Hynix");
    let die = infer_die("MTA8ATF1G64AZ", None).unwrap();
    assert_eq!(die.rule, DieRule::Prefix);
}

#[test]
fn mismatched_vendor_yields_nothing() {
    assert_eq!(infer_die("M393A2K43BB1-CTD", Some("Kingston")), None);
    assert_eq!(infer_die("HMA82GR7CJR8N-XN", Some("Micron Technology")), None);
}

#[test]
fn die_description_formats() {
    let die = infer_die("HMA82GR7CJR8N-XN", Some("SK Hynix"));
    assert_eq!(describe_die(die.as_ref(), Some(16384)), "16 Gb C-die (1ynm)");
    assert_eq!(describe_die(None, Some(8192)), "8 Gb");
    assert_eq!(describe_die(die.as_ref(), None), "Unknown");
}
