//! DDR4 Serial Presence Detect (SPD) image codec.
//!
//! Decodes and encodes the 512-byte JEDEC DDR4 SPD EEPROM layout: timing
//! parameters, module geometry, manufacturer identity, manufacturing data,
//! CRCs and Intel XMP 2.0 profiles. Everything here is a pure function over
//! a byte buffer; mutable state lives in `spd-studio-record`.
//!
//! # Overview
//!
//! - [`ParsedView`] - Every decoded field of an image
//! - [`timing`] - MTB/FTB timing codec, speed bins and CAS latencies
//! - [`fields`] - Geometry, identity and manufacturer field codecs
//! - [`manufacturers`] - JEP106 manufacturer registry
//! - [`die_database`] - Heuristic die inference from part numbers
//! - [`xmp`] - XMP profile decode and encode
//! - [`crc`] - SPD CRC-16 verification and repair
//!
//! # Example
//!
//! ```
//! use spd_studio_codec::timing::{write_timing_ns, TimingField};
//! use spd_studio_codec::{ParsedView, SPD_SIZE};
//!
//! let mut image = [0u8; SPD_SIZE];
//! image[2] = 0x0C; // DDR4
//! write_timing_ns(&mut image, TimingField::TckMin, 0.625).unwrap();
//! write_timing_ns(&mut image, TimingField::Taa, 10.0).unwrap();
//!
//! let view = ParsedView::parse(&image).unwrap();
//! assert_eq!(view.speed_grade, 3200);
//! assert_eq!(view.cl(), 16);
//! ```

pub mod constants;
pub mod crc;
pub mod die_database;
mod error;
pub mod fields;
mod image;
pub mod manufacturers;
pub mod timing;
mod view;
pub mod xmp;

pub use constants::SPD_SIZE;
pub use error::{SpdError, SpdResult};
pub use image::{
    check_range, ensure_ddr4, image_from_slice, is_ddr4, is_ddr4 as is_valid, padded,
    with_odd_parity, SpdImage,
};
pub use timing::{TimingField, TimingInfo};
pub use view::ParsedView;
pub use xmp::{XmpInfo, XmpProfile, XmpProfileSpec, XmpSlot};
