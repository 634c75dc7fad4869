//! Intel XMP 2.0 overclocking profiles (bytes 384-486).

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{SpdError, SpdResult};
use crate::image::SpdImage;
use crate::timing::{decode_ps, split_ps, tck_ps_for_speed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XmpSlot {
    Profile1,
    Profile2,
}

impl XmpSlot {
    pub const ALL: [XmpSlot; 2] = [XmpSlot::Profile1, XmpSlot::Profile2];

    pub fn from_number(n: u8) -> Option<XmpSlot> {
        match n {
            1 => Some(XmpSlot::Profile1),
            2 => Some(XmpSlot::Profile2),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            XmpSlot::Profile1 => 1,
            XmpSlot::Profile2 => 2,
        }
    }

    pub fn start(self) -> usize {
        match self {
            XmpSlot::Profile1 => XMP_PROFILE1_START,
            XmpSlot::Profile2 => XMP_PROFILE2_START,
        }
    }

    fn enable_bit(self) -> u8 {
        1 << (self.number() - 1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XmpProfile {
    pub slot: u8,
    /// Bit for this slot is set in byte 386.
    pub enabled: bool,
    /// Volts.
    pub voltage: f64,
    /// MT/s.
    pub frequency: u32,
    /// Nanoseconds.
    pub tck: f64,
    pub cl: u32,
    pub trcd: u32,
    pub trp: u32,
    pub tras: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XmpInfo {
    /// Header magic present. Says nothing about whether any profile is.
    pub supported: bool,
    pub version: Option<String>,
    pub enabled_mask: u8,
    pub profiles: Vec<XmpProfile>,
}

/// Field values for a new profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct XmpProfileSpec {
    /// MT/s.
    pub frequency: u32,
    /// Volts, 1.200..=1.515.
    pub voltage: f64,
    pub cl: u32,
    pub trcd: u32,
    pub trp: u32,
    pub tras: u32,
}

// ── Voltage byte ──────────────────────────────────────────────────────────

const VOLTAGE_BASE_MV: u32 = 1200;
const VOLTAGE_STEP_MV: u32 = 5;
const VOLTAGE_CODE_MAX: u32 = 0x3F;
const VOLTAGE_PRESENT: u8 = 0x80;

fn is_absent(voltage_byte: u8) -> bool {
    voltage_byte == 0x00 || voltage_byte == 0xFF
}

pub fn decode_voltage(byte: u8) -> f64 {
    let mv = VOLTAGE_BASE_MV + u32::from(byte & 0x3F) * VOLTAGE_STEP_MV;
    f64::from(mv) / 1000.0
}

pub fn encode_voltage(volts: f64) -> SpdResult<u8> {
    let mv = (volts * 1000.0).round();
    let max_mv = VOLTAGE_BASE_MV + VOLTAGE_CODE_MAX * VOLTAGE_STEP_MV;
    if !mv.is_finite() || mv < f64::from(VOLTAGE_BASE_MV) || mv > f64::from(max_mv) {
        return Err(SpdError::out_of_range(
            "XMP voltage",
            format!("{volts} V is outside 1.200..=1.515 V"),
        ));
    }
    let steps = ((mv - f64::from(VOLTAGE_BASE_MV)) / f64::from(VOLTAGE_STEP_MV)).round() as u8;
    Ok(VOLTAGE_PRESENT | steps)
}

// ── Frequency ─────────────────────────────────────────────────────────────

/// Shortest tCK for which the whole-picosecond period still pins down a
/// small set of data rates.
const MIN_SNAP_TCK_PS: i64 = 250;

/// Nominal data rates sit on a 100 MT/s grid or on the 400/3 MT/s grid
/// (2133, 2666, 2933, 3466, ...).
fn is_nominal_rate(mts: u32) -> bool {
    if mts % 100 == 0 {
        return true;
    }
    let k = (u64::from(mts) * 3 + 200) / 400;
    k * 400 / 3 == u64::from(mts)
}

/// MT/s for a stored clock period.
///
/// Several data rates round to the same whole-picosecond tCK; the nominal
/// one among them is reported (3600 rather than 3597 for 556 ps), falling
/// back to `floor(2_000_000 / tck_ps)`.
pub fn frequency_for_tck(tck_ps: i64) -> u32 {
    if tck_ps <= 0 {
        return 0;
    }
    let plain = (2_000_000 / tck_ps) as u32;
    if tck_ps < MIN_SNAP_TCK_PS {
        return plain;
    }
    let lo = (2_000_000 / (tck_ps + 1)) as u32;
    let hi = (2_000_000 / (tck_ps - 1)) as u32 + 1;
    let matches: Vec<u32> = (lo.max(1)..=hi)
        .filter(|&mts| tck_ps_for_speed(mts) == Ok(tck_ps))
        .collect();
    matches
        .iter()
        .copied()
        .find(|&mts| mts % 100 == 0)
        .or_else(|| matches.iter().copied().find(|&mts| is_nominal_rate(mts)))
        .unwrap_or(plain)
}

// ── Decode ────────────────────────────────────────────────────────────────

pub fn is_xmp_supported(image: &SpdImage) -> bool {
    image[XMP_HEADER] == XMP_MAGIC
}

/// Decodes one profile window; `None` when the voltage byte is a sentinel.
pub fn decode_xmp_profile(image: &SpdImage, slot: XmpSlot) -> Option<XmpProfile> {
    let w = &image[slot.start()..slot.start() + XMP_PROFILE_LEN];
    if is_absent(w[XMP_VOLTAGE]) {
        tracing::debug!(slot = slot.number(), byte = w[XMP_VOLTAGE], "xmp profile absent");
        return None;
    }
    let tck_ps = decode_ps(u32::from(w[XMP_TCK]), Some(w[XMP_TCK_FTB])).max(0);
    let frequency = frequency_for_tck(tck_ps);
    let tras = (u32::from(w[XMP_TRAS_HIGH] & 0x0F) << 8) | u32::from(w[XMP_TRAS_LOW]);
    let profile = XmpProfile {
        slot: slot.number(),
        enabled: image[XMP_PROFILE_ENABLE] & slot.enable_bit() != 0,
        voltage: decode_voltage(w[XMP_VOLTAGE]),
        frequency,
        tck: tck_ps as f64 / 1000.0,
        cl: u32::from(w[XMP_CL]),
        trcd: u32::from(w[XMP_TRCD]),
        trp: u32::from(w[XMP_TRP]),
        tras,
    };
    tracing::debug!(
        slot = profile.slot,
        frequency = profile.frequency,
        voltage = profile.voltage,
        cl = profile.cl,
        "xmp profile decoded"
    );
    Some(profile)
}

pub fn decode_xmp(image: &SpdImage) -> XmpInfo {
    if !is_xmp_supported(image) {
        return XmpInfo {
            supported: false,
            version: None,
            enabled_mask: 0,
            profiles: Vec::new(),
        };
    }
    let version = match image[XMP_VERSION] {
        0 => None,
        v => Some(format!("{}.{}", v >> 4, v & 0x0F)),
    };
    XmpInfo {
        supported: true,
        version,
        enabled_mask: image[XMP_PROFILE_ENABLE] & 0x03,
        profiles: XmpSlot::ALL
            .into_iter()
            .filter_map(|slot| decode_xmp_profile(image, slot))
            .collect(),
    }
}

// ── Encode ────────────────────────────────────────────────────────────────

fn cycles_u8(field: &str, value: u32) -> SpdResult<u8> {
    match u8::try_from(value) {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(SpdError::out_of_range(
            format!("XMP {field}"),
            format!("{value} cycles is outside 1..=255"),
        )),
    }
}

/// Writes a profile into `slot`, installing the XMP 2.0 header when missing
/// and setting the slot's enable bit. The other slot is left untouched.
pub fn write_xmp_profile(image: &mut SpdImage, slot: XmpSlot, spec: &XmpProfileSpec) -> SpdResult<()> {
    let voltage = encode_voltage(spec.voltage)?;
    if spec.frequency == 0 {
        return Err(SpdError::out_of_range("XMP frequency", "0 MT/s"));
    }
    let tck_ps = tck_ps_for_speed(spec.frequency)?;
    let (tck_mtb, tck_fine) = split_ps(tck_ps);
    if !(1..=255).contains(&tck_mtb) {
        return Err(SpdError::out_of_range(
            "XMP frequency",
            format!("{} MT/s does not fit the tCK byte", spec.frequency),
        ));
    }
    let stored = frequency_for_tck(tck_ps);
    if stored != spec.frequency {
        return Err(SpdError::out_of_range(
            "XMP frequency",
            format!(
                "{} MT/s cannot be stored exactly ({tck_ps} ps reads back as {stored} MT/s)",
                spec.frequency
            ),
        ));
    }
    let cl = cycles_u8("CL", spec.cl)?;
    let trcd = cycles_u8("tRCD", spec.trcd)?;
    let trp = cycles_u8("tRP", spec.trp)?;
    if spec.tras == 0 || spec.tras > 0x0FFF {
        return Err(SpdError::out_of_range(
            "XMP tRAS",
            format!("{} cycles is outside 1..=4095", spec.tras),
        ));
    }

    if !is_xmp_supported(image) {
        image[XMP_HEADER] = XMP_MAGIC;
        image[XMP_MAGIC_2] = XMP_MAGIC_2_VALUE;
        image[XMP_VERSION] = XMP_VERSION_2_0;
    }
    image[XMP_PROFILE_ENABLE] |= slot.enable_bit();

    let start = slot.start();
    let w = &mut image[start..start + XMP_PROFILE_LEN];
    w[XMP_VOLTAGE] = voltage;
    w[XMP_TCK] = tck_mtb as u8;
    w[XMP_TCK_FTB] = tck_fine;
    w[XMP_CL] = cl;
    w[XMP_TRCD] = trcd;
    w[XMP_TRP] = trp;
    w[XMP_TRAS_HIGH] = (w[XMP_TRAS_HIGH] & 0xF0) | ((spec.tras >> 8) as u8 & 0x0F);
    w[XMP_TRAS_LOW] = (spec.tras & 0xFF) as u8;
    tracing::debug!(slot = slot.number(), frequency = spec.frequency, "xmp profile written");
    Ok(())
}

/// Zeroes the slot's window and clears its enable bit.
pub fn clear_xmp_profile(image: &mut SpdImage, slot: XmpSlot) {
    let start = slot.start();
    image[start..start + XMP_PROFILE_LEN].fill(0);
    image[XMP_PROFILE_ENABLE] &= !slot.enable_bit();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voltage_codes() {
        assert_eq!(decode_voltage(0x80), 1.2);
        assert_eq!(decode_voltage(0x9E), 1.35);
        assert_eq!(encode_voltage(1.35), Ok(0x9E));
        assert_eq!(encode_voltage(1.2), Ok(0x80));
        assert_eq!(encode_voltage(1.515), Ok(0xBF));
        assert!(encode_voltage(1.1).is_err());
        assert!(encode_voltage(1.6).is_err());
        assert!(encode_voltage(f64::NAN).is_err());
    }

    #[test]
    fn enable_bits() {
        assert_eq!(XmpSlot::Profile1.enable_bit(), 0b01);
        assert_eq!(XmpSlot::Profile2.enable_bit(), 0b10);
        assert_eq!(XmpSlot::from_number(3), None);
    }
}
