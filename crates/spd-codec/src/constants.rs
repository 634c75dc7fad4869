//! JEDEC DDR4 SPD layout constants.
//!
//! Byte offsets and bit positions follow JEDEC Standard No. 21-C, Annex L
//! (DDR4 SPD, revision 1.x). XMP offsets follow the Intel XMP 2.0 layout.

/// Size of a full DDR4 SPD EEPROM image.
pub const SPD_SIZE: usize = 512;

/// EEPROM page size (DDR4 SPD is addressed as two 256-byte pages).
pub const SPD_PAGE_SIZE: usize = 256;

/// Medium timebase in picoseconds.
pub const MTB_PS: i64 = 125;

/// Fine timebase in picoseconds.
pub const FTB_PS: i64 = 1;

// ── Memory type markers (byte 2) ──────────────────────────────────────────

pub const DRAM_TYPE_DDR3: u8 = 0x0B;
pub const DRAM_TYPE_DDR4: u8 = 0x0C;
pub const DRAM_TYPE_DDR4E: u8 = 0x0E;
pub const DRAM_TYPE_LPDDR3: u8 = 0x0F;
pub const DRAM_TYPE_LPDDR4: u8 = 0x10;
pub const DRAM_TYPE_DDR5: u8 = 0x12;

// ── Base configuration (bytes 0-14) ───────────────────────────────────────

pub const BYTES_USED: usize = 0;
pub const REVISION: usize = 1;
pub const DRAM_TYPE: usize = 2;
pub const MODULE_TYPE: usize = 3;
pub const DENSITY_BANKS: usize = 4;
pub const ADDRESSING: usize = 5;
pub const PACKAGE_TYPE: usize = 6;
pub const OPTIONAL_FEATURES: usize = 7;
pub const THERMAL_REFRESH: usize = 8;
pub const OTHER_OPTIONAL: usize = 9;
pub const SECONDARY_PACKAGE: usize = 10;
pub const VOLTAGE: usize = 11;
pub const MODULE_ORG: usize = 12;
pub const BUS_WIDTH: usize = 13;
pub const THERMAL_SENSOR: usize = 14;

// ── Timing parameters (bytes 17-45) ───────────────────────────────────────

pub const TIMEBASES: usize = 17;
pub const TCK_MIN: usize = 18;
pub const TCK_MAX: usize = 19;
pub const CAS_LATENCIES: usize = 20;
pub const CAS_LATENCIES_LEN: usize = 4;
pub const TAA_MIN: usize = 24;
pub const TRCD_MIN: usize = 25;
pub const TRP_MIN: usize = 26;
/// Shared byte: bits [3:0] tRAS high nibble, bits [7:4] tRC high nibble.
pub const TRAS_TRC_HIGH: usize = 27;
pub const TRAS_MIN_LOW: usize = 28;
pub const TRC_MIN_LOW: usize = 29;
pub const TRFC1_LOW: usize = 30;
pub const TRFC1_HIGH: usize = 31;
pub const TRFC2_LOW: usize = 32;
pub const TRFC2_HIGH: usize = 33;
pub const TRFC4_LOW: usize = 34;
pub const TRFC4_HIGH: usize = 35;
pub const TFAW_HIGH: usize = 36;
pub const TFAW_LOW: usize = 37;
pub const TRRD_S_MIN: usize = 38;
pub const TRRD_L_MIN: usize = 39;
pub const TCCD_L_MIN: usize = 40;
pub const TWR_HIGH: usize = 41;
pub const TWR_LOW: usize = 42;
/// Shared byte: bits [3:0] tWTR_S high nibble, bits [7:4] tWTR_L high nibble.
pub const TWTR_HIGH: usize = 43;
pub const TWTR_S_LOW: usize = 44;
pub const TWTR_L_LOW: usize = 45;

// ── Fine timebase offsets (bytes 117-125) ─────────────────────────────────

pub const TCCD_L_MIN_FTB: usize = 117;
pub const TRRD_L_MIN_FTB: usize = 118;
pub const TRRD_S_MIN_FTB: usize = 119;
pub const TRC_MIN_FTB: usize = 120;
pub const TRP_MIN_FTB: usize = 121;
pub const TRCD_MIN_FTB: usize = 122;
pub const TAA_MIN_FTB: usize = 123;
pub const TCK_MAX_FTB: usize = 124;
pub const TCK_MIN_FTB: usize = 125;

// ── CRC (bytes 126-127, 254-255) ──────────────────────────────────────────

pub const CRC_BASE: usize = 126;
pub const CRC_MODULE: usize = 254;

// ── Manufacturing information (bytes 320-352) ─────────────────────────────

pub const MODULE_MANUFACTURER_ID: usize = 320;
pub const MANUFACTURING_LOCATION: usize = 322;
pub const MANUFACTURING_YEAR: usize = 323;
pub const MANUFACTURING_WEEK: usize = 324;
pub const SERIAL_NUMBER: usize = 325;
pub const SERIAL_NUMBER_LEN: usize = 4;
pub const PART_NUMBER: usize = 329;
pub const PART_NUMBER_LEN: usize = 20;
pub const MODULE_REVISION: usize = 349;
pub const DRAM_MANUFACTURER_ID: usize = 350;
pub const DRAM_STEPPING: usize = 352;

// ── XMP 2.0 (bytes 384-486) ───────────────────────────────────────────────

pub const XMP_HEADER: usize = 384;
pub const XMP_MAGIC: u8 = 0x0C;
pub const XMP_MAGIC_2: usize = 385;
pub const XMP_MAGIC_2_VALUE: u8 = 0x4A;
/// Bit 0 = profile 1 enabled, bit 1 = profile 2 enabled.
pub const XMP_PROFILE_ENABLE: usize = 386;
pub const XMP_VERSION: usize = 387;
pub const XMP_VERSION_2_0: u8 = 0x20;
pub const XMP_PROFILE1_START: usize = 393;
pub const XMP_PROFILE2_START: usize = 440;
pub const XMP_PROFILE_LEN: usize = 47;

// Offsets inside a profile window.
pub const XMP_VOLTAGE: usize = 0;
pub const XMP_TCK: usize = 1;
pub const XMP_CL: usize = 8;
pub const XMP_TRCD: usize = 9;
pub const XMP_TRP: usize = 10;
pub const XMP_TRAS_HIGH: usize = 11;
pub const XMP_TRAS_LOW: usize = 12;
/// Signed fine-timebase correction for `XMP_TCK`.
pub const XMP_TCK_FTB: usize = 38;
