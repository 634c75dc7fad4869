//! Fixed-size SPD image helpers.

use crate::constants::{DRAM_TYPE, DRAM_TYPE_DDR4, SPD_SIZE};
use crate::error::{SpdError, SpdResult};

/// A complete DDR4 SPD EEPROM image.
pub type SpdImage = [u8; SPD_SIZE];

/// Copies `data` into a new image, failing unless it is exactly 512 bytes.
pub fn image_from_slice(data: &[u8]) -> SpdResult<SpdImage> {
    if data.len() != SPD_SIZE {
        return Err(SpdError::SizeMismatch {
            expected: SPD_SIZE,
            actual: data.len(),
        });
    }
    let mut image = [0u8; SPD_SIZE];
    image.copy_from_slice(data);
    Ok(image)
}

/// Copies `data` into a new image, zero-padding short input and dropping
/// anything past 512 bytes.
///
/// Only for analysing partial dumps: decoders never index past the end of
/// the copy. Loading into a record still requires an exact-size buffer.
pub fn padded(data: &[u8]) -> SpdImage {
    let mut image = [0u8; SPD_SIZE];
    let n = data.len().min(SPD_SIZE);
    image[..n].copy_from_slice(&data[..n]);
    image
}

/// Returns `true` when the DRAM-type byte marks the image as DDR4.
pub fn is_ddr4(image: &[u8]) -> bool {
    image.get(DRAM_TYPE).copied() == Some(DRAM_TYPE_DDR4)
}

/// Fails with [`SpdError::Unsupported`] unless the image is DDR4.
pub fn ensure_ddr4(image: &[u8]) -> SpdResult<()> {
    if is_ddr4(image) {
        Ok(())
    } else {
        Err(SpdError::Unsupported {
            dram_type: image.get(DRAM_TYPE).copied().unwrap_or(0),
        })
    }
}

/// Validates that `len` bytes starting at `offset` lie inside an image.
pub fn check_range(offset: usize, len: usize) -> SpdResult<()> {
    match offset.checked_add(len) {
        Some(end) if end <= SPD_SIZE => Ok(()),
        _ => Err(SpdError::OutOfRange {
            field: format!("offset 0x{offset:03X}"),
            detail: format!("{len} byte(s) do not fit in a {SPD_SIZE}-byte image"),
        }),
    }
}

/// Computes the odd-parity bit for the low seven bits of `value` and returns
/// the byte with bit 7 set accordingly.
pub fn with_odd_parity(value: u8) -> u8 {
    let low = value & 0x7F;
    if low.count_ones() % 2 == 0 {
        low | 0x80
    } else {
        low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_and_strict_copy() {
        let short = [0x23, 0x11, 0x0C];
        let image = padded(&short);
        assert_eq!(&image[..3], &short);
        assert!(image[3..].iter().all(|&b| b == 0));
        assert!(is_ddr4(&image));

        assert_eq!(
            image_from_slice(&short),
            Err(SpdError::SizeMismatch {
                expected: 512,
                actual: 3
            })
        );
        assert!(image_from_slice(&[0u8; 512]).is_ok());
    }

    #[test]
    fn range_checks() {
        assert!(check_range(0, 512).is_ok());
        assert!(check_range(511, 1).is_ok());
        assert!(check_range(511, 2).is_err());
        assert!(check_range(usize::MAX, 2).is_err());
    }

    #[test]
    fn odd_parity() {
        assert_eq!(with_odd_parity(0x4E), 0xCE);
        assert_eq!(with_odd_parity(0x2C), 0x2C);
        assert_eq!(with_odd_parity(0x00), 0x80);
        assert_eq!(with_odd_parity(0x05), 0x85);
        assert_eq!(with_odd_parity(0xCE), 0xCE);
    }
}
