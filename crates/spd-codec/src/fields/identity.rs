//! Manufacturing identity: part number, serial number, manufacturing date,
//! location, revision and DRAM stepping.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{SpdError, SpdResult};
use crate::image::SpdImage;

// ── Part number (bytes 329-348) ───────────────────────────────────────────

/// Decodes the 20-byte ASCII part number, dropping non-printable bytes and
/// trailing padding.
pub fn decode_part_number(image: &SpdImage) -> String {
    let text: String = image[PART_NUMBER..PART_NUMBER + PART_NUMBER_LEN]
        .iter()
        .filter(|&&b| b.is_ascii_graphic() || b == b' ')
        .map(|&b| b as char)
        .collect();
    text.trim_end().to_string()
}

/// Writes `text` left-justified and space-padded to 20 bytes; longer input
/// is truncated.
pub fn write_part_number(image: &mut SpdImage, text: &str) -> SpdResult<()> {
    if let Some(c) = text.chars().find(|c| !(c.is_ascii_graphic() || *c == ' ')) {
        return Err(SpdError::invalid(
            "part number",
            text,
            format!("character {c:?} is not printable ASCII"),
        ));
    }
    let bytes = &text.as_bytes()[..text.len().min(PART_NUMBER_LEN)];
    let field = &mut image[PART_NUMBER..PART_NUMBER + PART_NUMBER_LEN];
    field.fill(b' ');
    field[..bytes.len()].copy_from_slice(bytes);
    Ok(())
}

// ── Serial number (bytes 325-328) ─────────────────────────────────────────

/// Eight uppercase hex digits, byte 325 first.
pub fn decode_serial_number(image: &SpdImage) -> String {
    image[SERIAL_NUMBER..SERIAL_NUMBER + SERIAL_NUMBER_LEN]
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect()
}

/// Parses up to eight hex digits (optional `0x` prefix, whitespace ignored)
/// into four bytes, most significant first. Short input is zero-extended.
pub fn parse_serial_number(text: &str) -> SpdResult<[u8; SERIAL_NUMBER_LEN]> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = compact
        .strip_prefix("0x")
        .or_else(|| compact.strip_prefix("0X"))
        .unwrap_or(&compact);
    if digits.is_empty() {
        return Err(SpdError::invalid("serial number", text, "no hex digits"));
    }
    if let Some(c) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(SpdError::invalid(
            "serial number",
            text,
            format!("{c:?} is not a hex digit"),
        ));
    }
    if digits.len() > SERIAL_NUMBER_LEN * 2 {
        return Err(SpdError::invalid(
            "serial number",
            text,
            format!("more than {} hex digits", SERIAL_NUMBER_LEN * 2),
        ));
    }
    let value = u32::from_str_radix(digits, 16)
        .map_err(|e| SpdError::invalid("serial number", text, e.to_string()))?;
    Ok(value.to_be_bytes())
}

pub fn write_serial_number(image: &mut SpdImage, text: &str) -> SpdResult<()> {
    let bytes = parse_serial_number(text)?;
    image[SERIAL_NUMBER..SERIAL_NUMBER + SERIAL_NUMBER_LEN].copy_from_slice(&bytes);
    Ok(())
}

// ── Manufacturing date (bytes 323-324, BCD) ───────────────────────────────

pub fn bcd_decode(byte: u8) -> Option<u8> {
    let (hi, lo) = (byte >> 4, byte & 0x0F);
    (hi <= 9 && lo <= 9).then_some(hi * 10 + lo)
}

pub fn bcd_encode(value: u8) -> Option<u8> {
    (value <= 99).then_some(((value / 10) << 4) | (value % 10))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ManufacturingDate {
    pub year: u16,
    /// `None` when the week byte is blank or not valid BCD.
    pub week: Option<u8>,
}

impl ManufacturingDate {
    /// `None` when the year byte is blank (0x00/0xFF) or not valid BCD.
    pub fn decode(image: &SpdImage) -> Option<ManufacturingDate> {
        let year_byte = image[MANUFACTURING_YEAR];
        if year_byte == 0x00 || year_byte == 0xFF {
            return None;
        }
        let year = 2000 + u16::from(bcd_decode(year_byte)?);
        let week = match image[MANUFACTURING_WEEK] {
            0x00 | 0xFF => None,
            byte => bcd_decode(byte),
        };
        Some(ManufacturingDate { year, week })
    }
}

impl fmt::Display for ManufacturingDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.week {
            Some(week) => write!(f, "{} Week {:02}", self.year, week),
            None => write!(f, "{}", self.year),
        }
    }
}

/// A parsed date edit; a missing week leaves byte 324 untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateInput {
    pub year: u16,
    pub week: Option<u8>,
}

/// Accepts `YYYY`, `WNN/YYYY`, `YYYY-WNN` and `YYYY Week NN`.
pub fn parse_manufacturing_date(text: &str) -> SpdResult<DateInput> {
    let input = text.trim();
    let (year, week) = if let Some((week, year)) = input.split_once('/') {
        let week = week
            .strip_prefix(|c: char| c.eq_ignore_ascii_case(&'w'))
            .ok_or_else(|| SpdError::invalid("date", text, "expected WNN/YYYY"))?;
        (year, Some(week))
    } else if let Some((year, week)) = input.split_once('-') {
        let week = week
            .strip_prefix(|c: char| c.eq_ignore_ascii_case(&'w'))
            .ok_or_else(|| SpdError::invalid("date", text, "expected YYYY-WNN"))?;
        (year, Some(week))
    } else {
        let mut parts = input.split_whitespace();
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(year), None, None, None) => (year, None),
            (Some(year), Some(word), Some(week), None) if word.eq_ignore_ascii_case("week") => {
                (year, Some(week))
            }
            _ => return Err(SpdError::invalid("date", text, "unrecognized date format")),
        }
    };

    let year = parse_digits(text, year, 4)?;
    if !(2001..=2099).contains(&year) {
        return Err(SpdError::out_of_range(
            "manufacturing year",
            format!("{year} is outside 2001..=2099"),
        ));
    }
    let week = match week {
        Some(w) => {
            let w = parse_digits(text, w, 2)?;
            if !(1..=53).contains(&w) {
                return Err(SpdError::out_of_range(
                    "manufacturing week",
                    format!("{w} is outside 1..=53"),
                ));
            }
            Some(w as u8)
        }
        None => None,
    };
    Ok(DateInput { year, week })
}

fn parse_digits(text: &str, digits: &str, max_len: usize) -> SpdResult<u16> {
    if digits.is_empty() || digits.len() > max_len || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SpdError::invalid("date", text, format!("{digits:?} is not a number")));
    }
    digits
        .parse()
        .map_err(|_| SpdError::invalid("date", text, format!("{digits:?} is not a number")))
}

pub fn write_manufacturing_date(image: &mut SpdImage, date: DateInput) -> SpdResult<()> {
    if !(2001..=2099).contains(&date.year) {
        return Err(SpdError::out_of_range(
            "manufacturing year",
            format!("{} is outside 2001..=2099", date.year),
        ));
    }
    let year = bcd_encode((date.year - 2000) as u8)
        .ok_or_else(|| SpdError::out_of_range("manufacturing year", date.year.to_string()))?;
    let week = match date.week {
        Some(w) if (1..=53).contains(&w) => bcd_encode(w),
        Some(w) => {
            return Err(SpdError::out_of_range(
                "manufacturing week",
                format!("{w} is outside 1..=53"),
            ))
        }
        None => None,
    };
    image[MANUFACTURING_YEAR] = year;
    if let Some(week) = week {
        image[MANUFACTURING_WEEK] = week;
    }
    Ok(())
}

// ── Single-byte identity fields ───────────────────────────────────────────

pub fn manufacturing_location(image: &SpdImage) -> u8 {
    image[MANUFACTURING_LOCATION]
}

pub fn module_revision(image: &SpdImage) -> u8 {
    image[MODULE_REVISION]
}

pub fn dram_stepping(image: &SpdImage) -> Option<u8> {
    match image[DRAM_STEPPING] {
        0xFF => None,
        stepping => Some(stepping),
    }
}
