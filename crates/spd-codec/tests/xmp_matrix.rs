//! XMP 2.0 profile matrix.

use spd_studio_codec::constants::*;
use spd_studio_codec::xmp::{
    clear_xmp_profile, decode_xmp, decode_xmp_profile, frequency_for_tck, is_xmp_supported,
    write_xmp_profile,
};
use spd_studio_codec::{SpdError, XmpProfileSpec, XmpSlot, SPD_SIZE};

fn blank() -> [u8; SPD_SIZE] {
    let mut image = [0u8; SPD_SIZE];
    image[DRAM_TYPE] = DRAM_TYPE_DDR4;
    image
}

fn ddr4_3200() -> XmpProfileSpec {
    XmpProfileSpec {
        frequency: 3200,
        voltage: 1.35,
        cl: 16,
        trcd: 18,
        trp: 18,
        tras: 38,
    }
}

#[test]
fn no_header_means_unsupported() {
    let info = decode_xmp(&blank());
    assert!(!info.supported);
    assert!(info.profiles.is_empty());
    assert_eq!(info.version, None);
}

#[test]
fn header_with_sentinel_windows_has_no_profiles() {
    let mut image = blank();
    image[XMP_HEADER] = XMP_MAGIC;
    image[XMP_MAGIC_2] = XMP_MAGIC_2_VALUE;
    image[XMP_VERSION] = XMP_VERSION_2_0;
    let info = decode_xmp(&image);
    assert!(info.supported);
    assert_eq!(info.version.as_deref(), Some("2.0"));
    assert!(info.profiles.is_empty());

    image[XMP_PROFILE1_START + XMP_VOLTAGE] = 0xFF;
    image[XMP_PROFILE2_START + XMP_VOLTAGE] = 0xFF;
    assert!(decode_xmp(&image).profiles.is_empty());
}

#[test]
fn write_installs_header_and_enable_bit() {
    let mut image = blank();
    write_xmp_profile(&mut image, XmpSlot::Profile1, &ddr4_3200()).unwrap();
    assert!(is_xmp_supported(&image));
    assert_eq!(image[XMP_MAGIC_2], XMP_MAGIC_2_VALUE);
    assert_eq!(image[XMP_VERSION], XMP_VERSION_2_0);
    assert_eq!(image[XMP_PROFILE_ENABLE], 0b01);

    let w = XMP_PROFILE1_START;
    assert_eq!(image[w + XMP_VOLTAGE], 0x9E);
    assert_eq!(image[w + XMP_TCK], 5);
    assert_eq!(image[w + XMP_CL], 16);
    assert_eq!(image[w + XMP_TRCD], 18);
    assert_eq!(image[w + XMP_TRP], 18);
    assert_eq!(image[w + XMP_TRAS_LOW], 38);

    let info = decode_xmp(&image);
    assert_eq!(info.profiles.len(), 1);
    let p = &info.profiles[0];
    assert_eq!(p.slot, 1);
    assert!(p.enabled);
    assert_eq!(p.frequency, 3200);
    assert_eq!(p.voltage, 1.35);
    assert_eq!(p.tck, 0.625);
    assert_eq!((p.cl, p.trcd, p.trp, p.tras), (16, 18, 18, 38));
}

#[test]
fn second_profile_keeps_first_enable_bit() {
    let mut image = blank();
    write_xmp_profile(&mut image, XmpSlot::Profile1, &ddr4_3200()).unwrap();
    let slower = XmpProfileSpec {
        frequency: 2666,
        voltage: 1.2,
        cl: 15,
        trcd: 17,
        trp: 17,
        tras: 35,
    };
    write_xmp_profile(&mut image, XmpSlot::Profile2, &slower).unwrap();
    assert_eq!(image[XMP_PROFILE_ENABLE], 0b11);

    let info = decode_xmp(&image);
    assert_eq!(info.enabled_mask, 0b11);
    assert_eq!(info.profiles.len(), 2);
    assert_eq!(info.profiles[1].slot, 2);
    assert_eq!(info.profiles[1].frequency, 2666);
    // 1.200 V is encoded with the presence flag so it never reads as absent.
    assert_eq!(image[XMP_PROFILE2_START + XMP_VOLTAGE], 0x80);
    assert_eq!(info.profiles[1].voltage, 1.2);
}

#[test]
fn long_tras_uses_high_nibble_and_keeps_upper_bits() {
    let mut image = blank();
    image[XMP_PROFILE1_START + XMP_TRAS_HIGH] = 0x50;
    let spec = XmpProfileSpec {
        tras: 0x234,
        ..ddr4_3200()
    };
    write_xmp_profile(&mut image, XmpSlot::Profile1, &spec).unwrap();
    assert_eq!(image[XMP_PROFILE1_START + XMP_TRAS_HIGH], 0x52);
    assert_eq!(image[XMP_PROFILE1_START + XMP_TRAS_LOW], 0x34);
    let profile = decode_xmp_profile(&image, XmpSlot::Profile1).unwrap();
    assert_eq!(profile.tras, 0x234);
}

#[test]
fn common_speeds_read_back_exactly() {
    for frequency in [2133, 2400, 2666, 2933, 3000, 3200, 3466, 3600, 3733, 4000, 4266] {
        let mut image = blank();
        let spec = XmpProfileSpec {
            frequency,
            ..ddr4_3200()
        };
        write_xmp_profile(&mut image, XmpSlot::Profile1, &spec).unwrap();
        let profile = decode_xmp_profile(&image, XmpSlot::Profile1).unwrap();
        assert_eq!(profile.frequency, frequency);
    }
}

#[test]
fn tck_carries_a_fine_offset() {
    let mut image = blank();
    let spec = XmpProfileSpec {
        frequency: 3600,
        ..ddr4_3200()
    };
    write_xmp_profile(&mut image, XmpSlot::Profile2, &spec).unwrap();
    // 556 ps = 4 * 125 + 56
    assert_eq!(image[XMP_PROFILE2_START + XMP_TCK], 4);
    assert_eq!(image[XMP_PROFILE2_START + XMP_TCK_FTB], 56);
    assert_eq!(decode_xmp_profile(&image, XmpSlot::Profile2).unwrap().tck, 0.556);
}

#[test]
fn frequencies_without_an_exact_period_are_rejected() {
    for frequency in [3598, 2132, 3199] {
        let mut image = blank();
        let spec = XmpProfileSpec {
            frequency,
            ..ddr4_3200()
        };
        let err = write_xmp_profile(&mut image, XmpSlot::Profile1, &spec).unwrap_err();
        assert!(matches!(err, SpdError::OutOfRange { .. }), "{frequency}: {err}");
        assert_eq!(image, blank());
    }
}

#[test]
fn coarse_periods_fall_back_to_plain_division() {
    assert_eq!(frequency_for_tck(0), 0);
    assert_eq!(frequency_for_tck(875), 2285);
    assert_eq!(frequency_for_tck(1_000), 2000);
    assert_eq!(frequency_for_tck(200), 10_000);
}

#[test]
fn invalid_profiles_leave_image_untouched() {
    let bad = [
        XmpProfileSpec { voltage: 1.6, ..ddr4_3200() },
        XmpProfileSpec { voltage: 1.1, ..ddr4_3200() },
        XmpProfileSpec { frequency: 0, ..ddr4_3200() },
        XmpProfileSpec { frequency: 40, ..ddr4_3200() },
        XmpProfileSpec { cl: 0, ..ddr4_3200() },
        XmpProfileSpec { trcd: 300, ..ddr4_3200() },
        XmpProfileSpec { tras: 5000, ..ddr4_3200() },
    ];
    for spec in bad {
        let mut image = blank();
        let err = write_xmp_profile(&mut image, XmpSlot::Profile2, &spec).unwrap_err();
        assert!(matches!(err, SpdError::OutOfRange { .. }), "{spec:?}: {err}");
        assert_eq!(image, blank(), "{spec:?}");
    }
}

#[test]
fn clear_profile_only_touches_its_slot() {
    let mut image = blank();
    write_xmp_profile(&mut image, XmpSlot::Profile1, &ddr4_3200()).unwrap();
    write_xmp_profile(&mut image, XmpSlot::Profile2, &ddr4_3200()).unwrap();
    clear_xmp_profile(&mut image, XmpSlot::Profile1);
    assert_eq!(image[XMP_PROFILE_ENABLE], 0b10);
    assert!(is_xmp_supported(&image));
    let info = decode_xmp(&image);
    assert_eq!(info.profiles.len(), 1);
    assert_eq!(info.profiles[0].slot, 2);
    assert!(image[XMP_PROFILE1_START..XMP_PROFILE1_START + XMP_PROFILE_LEN]
        .iter()
        .all(|&b| b == 0));
}

#[test]
fn disabled_but_present_profile_is_reported() {
    let mut image = blank();
    write_xmp_profile(&mut image, XmpSlot::Profile2, &ddr4_3200()).unwrap();
    image[XMP_PROFILE_ENABLE] = 0;
    let profile = decode_xmp_profile(&image, XmpSlot::Profile2).unwrap();
    assert!(!profile.enabled);
}
