//! Timing codec.
//!
//! DDR4 SPD stores every timing parameter as a count of Medium Timebase
//! units (MTB, 125 ps), optionally corrected by a signed Fine Timebase
//! byte (FTB, 1 ps, two's complement). Long parameters are split across a
//! low byte and either a full high byte or a nibble of a byte shared with
//! another parameter.
//!
//! Everything here converts between four domains: raw bytes, picoseconds,
//! clock cycles and MT/s speed bins. Decoders work on integer picoseconds
//! so a decode/encode cycle never drifts; nanoseconds are only produced at
//! the edges.

use serde::Serialize;

use crate::constants::*;
use crate::error::{SpdError, SpdResult};
use crate::image::SpdImage;

// ── Timebase arithmetic ───────────────────────────────────────────────────

/// Interprets a fine-timebase byte as a signed offset.
#[inline]
pub fn signed_fine(byte: u8) -> i64 {
    i64::from(byte as i8)
}

/// `mtb * 125 + signed(fine) * 1` in picoseconds.
pub fn decode_ps(mtb: u32, fine: Option<u8>) -> i64 {
    i64::from(mtb) * MTB_PS + fine.map(signed_fine).unwrap_or(0) * FTB_PS
}

/// Decodes an MTB count plus optional fine byte into nanoseconds.
pub fn decode_ns(mtb: u32, fine: Option<u8>) -> f64 {
    ps_to_ns(decode_ps(mtb, fine))
}

#[inline]
pub fn ps_to_ns(ps: i64) -> f64 {
    ps as f64 / 1000.0
}

/// Converts nanoseconds to whole picoseconds.
pub fn ns_to_ps(field: &str, ns: f64) -> SpdResult<i64> {
    if !ns.is_finite() || ns < 0.0 {
        return Err(SpdError::out_of_range(
            field,
            format!("{ns} ns is not a non-negative time"),
        ));
    }
    let ps = (ns * 1000.0).round();
    if ps > i64::from(u32::MAX) as f64 {
        return Err(SpdError::out_of_range(field, format!("{ns} ns is too large")));
    }
    Ok(ps as i64)
}

/// Splits picoseconds into `(mtb, fine)` where `mtb = floor(ps / 125)` and
/// the remainder becomes the fine offset, clamped to the signed-byte range.
pub fn split_ps(ps: i64) -> (i64, u8) {
    let mtb = ps.div_euclid(MTB_PS);
    let remainder = ps - mtb * MTB_PS;
    let fine = (remainder / FTB_PS).clamp(i64::from(i8::MIN), i64::from(i8::MAX));
    (mtb, fine as i8 as u8)
}

/// Encodes nanoseconds into a single MTB byte and its fine-offset byte.
pub fn encode_ns(ns: f64) -> SpdResult<(u8, u8)> {
    let ps = ns_to_ps("timing", ns)?;
    let (mtb, fine) = split_ps(ps);
    let byte = u8::try_from(mtb).map_err(|_| {
        SpdError::out_of_range("timing", format!("{ns} ns exceeds 255 MTB units"))
    })?;
    Ok((byte, fine))
}

// ── Field layouts ─────────────────────────────────────────────────────────

/// Where the bits above the low byte of a split field live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighBits {
    /// Single-byte field.
    None,
    /// Bits [3:0] of the given byte.
    LowNibble(usize),
    /// Bits [7:4] of the given byte.
    HighNibble(usize),
    /// The whole given byte.
    Byte(usize),
}

/// Byte layout of one timing parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingLayout {
    pub low: usize,
    pub high: HighBits,
    pub fine: Option<usize>,
}

impl TimingLayout {
    /// Largest MTB count the field can hold.
    pub fn max_units(&self) -> i64 {
        match self.high {
            HighBits::None => 0xFF,
            HighBits::LowNibble(_) | HighBits::HighNibble(_) => 0xFFF,
            HighBits::Byte(_) => 0xFFFF,
        }
    }

    /// Reads the combined `(high << 8) | low` MTB count.
    pub fn read_units(&self, image: &SpdImage) -> u32 {
        let low = u32::from(image[self.low]);
        let high = match self.high {
            HighBits::None => 0,
            HighBits::LowNibble(o) => u32::from(image[o] & 0x0F),
            HighBits::HighNibble(o) => u32::from(image[o] >> 4),
            HighBits::Byte(o) => u32::from(image[o]),
        };
        (high << 8) | low
    }

    /// Writes an MTB count, preserving the neighbouring nibble of a shared
    /// byte.
    pub fn write_units(&self, image: &mut SpdImage, units: u32) {
        image[self.low] = (units & 0xFF) as u8;
        let high = ((units >> 8) & 0xFF) as u8;
        match self.high {
            HighBits::None => {}
            HighBits::LowNibble(o) => image[o] = (image[o] & 0xF0) | (high & 0x0F),
            HighBits::HighNibble(o) => image[o] = (image[o] & 0x0F) | ((high & 0x0F) << 4),
            HighBits::Byte(o) => image[o] = high,
        }
    }
}

/// Every timing parameter held in the base configuration section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TimingField {
    TckMin,
    TckMax,
    Taa,
    Trcd,
    Trp,
    Tras,
    Trc,
    Trfc1,
    Trfc2,
    Trfc4,
    Tfaw,
    TrrdS,
    TrrdL,
    TccdL,
    Twr,
    TwtrS,
    TwtrL,
}

impl TimingField {
    pub const ALL: [TimingField; 17] = [
        TimingField::TckMin,
        TimingField::TckMax,
        TimingField::Taa,
        TimingField::Trcd,
        TimingField::Trp,
        TimingField::Tras,
        TimingField::Trc,
        TimingField::Trfc1,
        TimingField::Trfc2,
        TimingField::Trfc4,
        TimingField::Tfaw,
        TimingField::TrrdS,
        TimingField::TrrdL,
        TimingField::TccdL,
        TimingField::Twr,
        TimingField::TwtrS,
        TimingField::TwtrL,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TimingField::TckMin => "tCK",
            TimingField::TckMax => "tCKmax",
            TimingField::Taa => "tAA",
            TimingField::Trcd => "tRCD",
            TimingField::Trp => "tRP",
            TimingField::Tras => "tRAS",
            TimingField::Trc => "tRC",
            TimingField::Trfc1 => "tRFC1",
            TimingField::Trfc2 => "tRFC2",
            TimingField::Trfc4 => "tRFC4",
            TimingField::Tfaw => "tFAW",
            TimingField::TrrdS => "tRRD_S",
            TimingField::TrrdL => "tRRD_L",
            TimingField::TccdL => "tCCD_L",
            TimingField::Twr => "tWR",
            TimingField::TwtrS => "tWTR_S",
            TimingField::TwtrL => "tWTR_L",
        }
    }

    /// Case-insensitive lookup by display name (`"tAA"`, `"trrd_s"`, ...).
    /// `"tCKmin"` is accepted as an alias of `"tCK"`.
    pub fn from_name(name: &str) -> Option<TimingField> {
        let wanted = name.trim();
        if wanted.eq_ignore_ascii_case("tCKmin") {
            return Some(TimingField::TckMin);
        }
        Self::ALL
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(wanted))
    }

    pub fn layout(self) -> TimingLayout {
        let (low, high, fine) = match self {
            TimingField::TckMin => (TCK_MIN, HighBits::None, Some(TCK_MIN_FTB)),
            TimingField::TckMax => (TCK_MAX, HighBits::None, Some(TCK_MAX_FTB)),
            TimingField::Taa => (TAA_MIN, HighBits::None, Some(TAA_MIN_FTB)),
            TimingField::Trcd => (TRCD_MIN, HighBits::None, Some(TRCD_MIN_FTB)),
            TimingField::Trp => (TRP_MIN, HighBits::None, Some(TRP_MIN_FTB)),
            TimingField::Tras => (TRAS_MIN_LOW, HighBits::LowNibble(TRAS_TRC_HIGH), None),
            TimingField::Trc => (
                TRC_MIN_LOW,
                HighBits::HighNibble(TRAS_TRC_HIGH),
                Some(TRC_MIN_FTB),
            ),
            TimingField::Trfc1 => (TRFC1_LOW, HighBits::Byte(TRFC1_HIGH), None),
            TimingField::Trfc2 => (TRFC2_LOW, HighBits::Byte(TRFC2_HIGH), None),
            TimingField::Trfc4 => (TRFC4_LOW, HighBits::Byte(TRFC4_HIGH), None),
            TimingField::Tfaw => (TFAW_LOW, HighBits::LowNibble(TFAW_HIGH), None),
            TimingField::TrrdS => (TRRD_S_MIN, HighBits::None, Some(TRRD_S_MIN_FTB)),
            TimingField::TrrdL => (TRRD_L_MIN, HighBits::None, Some(TRRD_L_MIN_FTB)),
            TimingField::TccdL => (TCCD_L_MIN, HighBits::None, Some(TCCD_L_MIN_FTB)),
            TimingField::Twr => (TWR_LOW, HighBits::LowNibble(TWR_HIGH), None),
            TimingField::TwtrS => (TWTR_S_LOW, HighBits::LowNibble(TWTR_HIGH), None),
            TimingField::TwtrL => (TWTR_L_LOW, HighBits::HighNibble(TWTR_HIGH), None),
        };
        TimingLayout { low, high, fine }
    }
}

/// Decodes one timing parameter in picoseconds. Negative results (a zero
/// MTB count with a negative fine offset) clamp to zero.
pub fn read_timing_ps(image: &SpdImage, field: TimingField) -> i64 {
    let layout = field.layout();
    let units = layout.read_units(image);
    let fine = layout.fine.map(|offset| image[offset]);
    decode_ps(units, fine).max(0)
}

/// Decodes one timing parameter in nanoseconds.
pub fn read_timing_ns(image: &SpdImage, field: TimingField) -> f64 {
    ps_to_ns(read_timing_ps(image, field))
}

/// Encodes `ns` into the field's bytes.
///
/// Fields with a fine byte take `floor(ps / 125)` MTB units and carry the
/// remainder as the fine offset; fields without one round to the nearest
/// MTB. Shared nibbles are read-modify-written.
pub fn write_timing_ns(image: &mut SpdImage, field: TimingField, ns: f64) -> SpdResult<()> {
    let ps = ns_to_ps(field.name(), ns)?;
    let layout = field.layout();
    let (units, fine) = match layout.fine {
        Some(_) => split_ps(ps),
        None => ((ps + MTB_PS / 2) / MTB_PS, 0),
    };
    let max = layout.max_units();
    if units > max {
        return Err(SpdError::out_of_range(
            field.name(),
            format!("{ns} ns needs {units} MTB units, the field holds at most {max}"),
        ));
    }
    layout.write_units(image, units as u32);
    if let Some(offset) = layout.fine {
        image[offset] = fine;
    }
    tracing::trace!(field = field.name(), ns, units, fine, "encoded timing");
    Ok(())
}

// ── Speed grades ──────────────────────────────────────────────────────────

/// A half-open `[min_ps, max_ps)` tCK range and its JEDEC speed bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedBin {
    pub min_ps: i64,
    pub max_ps: i64,
    pub mts: u32,
}

/// JEDEC DDR4 speed bins, fastest first. Contiguous and non-overlapping;
/// the 1600 bin closes at 1500 ps inclusive.
pub const SPEED_BINS: [SpeedBin; 6] = [
    SpeedBin { min_ps: 625, max_ps: 750, mts: 3200 },
    SpeedBin { min_ps: 750, max_ps: 833, mts: 2666 },
    SpeedBin { min_ps: 833, max_ps: 938, mts: 2400 },
    SpeedBin { min_ps: 938, max_ps: 1071, mts: 2133 },
    SpeedBin { min_ps: 1071, max_ps: 1250, mts: 1866 },
    SpeedBin { min_ps: 1250, max_ps: 1501, mts: 1600 },
];

/// Maps tCK to MT/s: the matching JEDEC bin, or `floor(2_000_000 / tck_ps)`
/// outside the table. Zero or negative tCK means "no data" and yields 0.
pub fn speed_grade(tck_ps: i64) -> u32 {
    if tck_ps <= 0 {
        return 0;
    }
    SPEED_BINS
        .iter()
        .find(|bin| bin.min_ps <= tck_ps && tck_ps < bin.max_ps)
        .map(|bin| bin.mts)
        .unwrap_or_else(|| (2_000_000 / tck_ps) as u32)
}

/// Clock period for a data rate, rounded to whole picoseconds.
pub fn tck_ps_for_speed(mts: u32) -> SpdResult<i64> {
    if mts == 0 {
        return Err(SpdError::out_of_range("speed", "0 MT/s has no clock period"));
    }
    let mts = i64::from(mts);
    Ok((2_000_000 + mts / 2) / mts)
}

// ── Cycles ────────────────────────────────────────────────────────────────

/// `round(t / tck)` on picoseconds, half away from zero. Zero tCK yields 0.
pub fn cycles_ps(t_ps: i64, tck_ps: i64) -> u32 {
    if tck_ps <= 0 || t_ps <= 0 {
        return 0;
    }
    ((2 * t_ps + tck_ps) / (2 * tck_ps)) as u32
}

/// `round(ns / tck_ns)`, zero when tCK is zero.
pub fn ns_to_cycles(ns: f64, tck_ns: f64) -> u32 {
    if tck_ns <= 0.0 || !ns.is_finite() || ns <= 0.0 {
        return 0;
    }
    (ns / tck_ns).round() as u32
}

pub fn cycles_to_ns(cycles: u32, tck_ns: f64) -> f64 {
    f64::from(cycles) * tck_ns
}

// ── CAS latency bitmap ────────────────────────────────────────────────────

/// Lowest CAS latency representable in the bitmap (bit 0).
pub const CL_BASE: u32 = 7;

/// Decodes the 4-byte CAS latency bitmap: bit `n` (byte 20 bit 0 first)
/// set means CL `7 + n` is supported. Sorted ascending.
pub fn decode_cas_latencies(bytes: [u8; CAS_LATENCIES_LEN]) -> Vec<u32> {
    let bitmap = u32::from_le_bytes(bytes);
    (0..32)
        .filter(|bit| bitmap & (1 << bit) != 0)
        .map(|bit| CL_BASE + bit)
        .collect()
}

/// Encodes a set of CAS latencies (7..=38) into the 4-byte bitmap.
pub fn encode_cas_latencies(latencies: &[u32]) -> SpdResult<[u8; CAS_LATENCIES_LEN]> {
    let mut bitmap = 0u32;
    for &cl in latencies {
        if !(CL_BASE..CL_BASE + 32).contains(&cl) {
            return Err(SpdError::out_of_range(
                "supported CAS latencies",
                format!("CL{cl} is outside CL{}..=CL{}", CL_BASE, CL_BASE + 31),
            ));
        }
        bitmap |= 1 << (cl - CL_BASE);
    }
    Ok(bitmap.to_le_bytes())
}

/// Reads the supported CAS latencies from an image.
pub fn supported_cas_latencies(image: &SpdImage) -> Vec<u32> {
    let mut bytes = [0u8; CAS_LATENCIES_LEN];
    bytes.copy_from_slice(&image[CAS_LATENCIES..CAS_LATENCIES + CAS_LATENCIES_LEN]);
    decode_cas_latencies(bytes)
}

/// Writes the supported CAS latencies into an image.
pub fn write_cas_latencies(image: &mut SpdImage, latencies: &[u32]) -> SpdResult<()> {
    let bytes = encode_cas_latencies(latencies)?;
    image[CAS_LATENCIES..CAS_LATENCIES + CAS_LATENCIES_LEN].copy_from_slice(&bytes);
    Ok(())
}

// ── Decoded timing set ────────────────────────────────────────────────────

/// All base timing parameters in nanoseconds plus the derived CAS latency.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimingInfo {
    #[serde(rename = "tCK")]
    pub tck: f64,
    #[serde(rename = "tCKmax")]
    pub tck_max: f64,
    #[serde(rename = "tAA")]
    pub taa: f64,
    #[serde(rename = "tRCD")]
    pub trcd: f64,
    #[serde(rename = "tRP")]
    pub trp: f64,
    #[serde(rename = "tRAS")]
    pub tras: f64,
    #[serde(rename = "tRC")]
    pub trc: f64,
    #[serde(rename = "tRFC1")]
    pub trfc1: f64,
    #[serde(rename = "tRFC2")]
    pub trfc2: f64,
    #[serde(rename = "tRFC4")]
    pub trfc4: f64,
    #[serde(rename = "tFAW")]
    pub tfaw: f64,
    #[serde(rename = "tRRD_S")]
    pub trrd_s: f64,
    #[serde(rename = "tRRD_L")]
    pub trrd_l: f64,
    #[serde(rename = "tCCD_L")]
    pub tccd_l: f64,
    #[serde(rename = "tWR")]
    pub twr: f64,
    #[serde(rename = "tWTR_S")]
    pub twtr_s: f64,
    #[serde(rename = "tWTR_L")]
    pub twtr_l: f64,
    /// `round(tAA / tCK)`; 0 when tCK is zero.
    #[serde(rename = "CL")]
    pub cl: u32,
}

impl TimingInfo {
    pub fn decode(image: &SpdImage) -> TimingInfo {
        let ns = |field| read_timing_ns(image, field);
        TimingInfo {
            tck: ns(TimingField::TckMin),
            tck_max: ns(TimingField::TckMax),
            taa: ns(TimingField::Taa),
            trcd: ns(TimingField::Trcd),
            trp: ns(TimingField::Trp),
            tras: ns(TimingField::Tras),
            trc: ns(TimingField::Trc),
            trfc1: ns(TimingField::Trfc1),
            trfc2: ns(TimingField::Trfc2),
            trfc4: ns(TimingField::Trfc4),
            tfaw: ns(TimingField::Tfaw),
            trrd_s: ns(TimingField::TrrdS),
            trrd_l: ns(TimingField::TrrdL),
            tccd_l: ns(TimingField::TccdL),
            twr: ns(TimingField::Twr),
            twtr_s: ns(TimingField::TwtrS),
            twtr_l: ns(TimingField::TwtrL),
            cl: cycles_ps(
                read_timing_ps(image, TimingField::Taa),
                read_timing_ps(image, TimingField::TckMin),
            ),
        }
    }

    pub fn get(&self, field: TimingField) -> f64 {
        match field {
            TimingField::TckMin => self.tck,
            TimingField::TckMax => self.tck_max,
            TimingField::Taa => self.taa,
            TimingField::Trcd => self.trcd,
            TimingField::Trp => self.trp,
            TimingField::Tras => self.tras,
            TimingField::Trc => self.trc,
            TimingField::Trfc1 => self.trfc1,
            TimingField::Trfc2 => self.trfc2,
            TimingField::Trfc4 => self.trfc4,
            TimingField::Tfaw => self.tfaw,
            TimingField::TrrdS => self.trrd_s,
            TimingField::TrrdL => self.trrd_l,
            TimingField::TccdL => self.tccd_l,
            TimingField::Twr => self.twr,
            TimingField::TwtrS => self.twtr_s,
            TimingField::TwtrL => self.twtr_l,
        }
    }

    /// `CL{cl}-{tRCD}-{tRP}-{tRAS}` in cycles, `"Unknown"` without a clock.
    pub fn timing_string(&self) -> String {
        if self.tck <= 0.0 {
            return "Unknown".to_string();
        }
        let cl = if self.cl > 0 {
            self.cl
        } else {
            ns_to_cycles(self.taa, self.tck)
        };
        format!(
            "CL{}-{}-{}-{}",
            cl,
            ns_to_cycles(self.trcd, self.tck),
            ns_to_cycles(self.trp, self.tck),
            ns_to_cycles(self.tras, self.tck)
        )
    }
}
