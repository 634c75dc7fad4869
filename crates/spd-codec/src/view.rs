//! Decoded, read-only view of a DDR4 SPD image.

use serde::Serialize;

use crate::constants::{DRAM_TYPE, MODULE_TYPE};
use crate::crc::{check_crc, CrcCheck};
use crate::die_database::{describe_die, infer_die, DieInfo, DIE_INFERENCE_NOTE};
use crate::error::SpdResult;
use crate::fields::geometry::has_thermal_sensor;
use crate::fields::identity::{
    decode_part_number, decode_serial_number, dram_stepping, manufacturing_location,
    module_revision,
};
use crate::fields::manufacturer::{dram_manufacturer, module_manufacturer};
use crate::fields::{
    Addressing, BankTopology, BusWidth, Capacity, Manufacturer, ManufacturingDate, MemoryType,
    ModuleType, SpdHeader, Voltage,
};
use crate::image::{ensure_ddr4, padded, SpdImage};
use crate::timing::{read_timing_ps, speed_grade, supported_cas_latencies, TimingField, TimingInfo};
use crate::xmp::{decode_xmp, XmpInfo};

/// Every decoded field of a DDR4 image. Recomputed on demand, never stored
/// alongside the bytes it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedView {
    pub memory_type: MemoryType,
    pub module_type: ModuleType,
    pub header: SpdHeader,
    pub capacity: Capacity,
    pub addressing: Addressing,
    pub banks: BankTopology,
    pub bus: BusWidth,
    pub voltage: Voltage,
    pub thermal_sensor: bool,
    pub manufacturer: Manufacturer,
    pub dram_manufacturer: Manufacturer,
    pub part_number: String,
    pub serial_number: String,
    pub manufacturing_date: Option<ManufacturingDate>,
    pub manufacturing_location: u8,
    pub module_revision: u8,
    pub dram_stepping: Option<u8>,
    pub timings: TimingInfo,
    /// MT/s.
    pub speed_grade: u32,
    pub timing_string: String,
    pub cas_latencies: Vec<u32>,
    pub die: Option<DieInfo>,
    pub die_description: String,
    pub die_note: &'static str,
    pub xmp: XmpInfo,
    pub crc: [CrcCheck; 2],
}

impl ParsedView {
    /// Decodes `data`, which may be shorter than a full image (missing bytes
    /// read as zero). Fails with `Unsupported` unless byte 2 marks DDR4.
    pub fn parse(data: &[u8]) -> SpdResult<ParsedView> {
        ensure_ddr4(data)?;
        Ok(ParsedView::decode(&padded(data)))
    }

    fn decode(image: &SpdImage) -> ParsedView {
        let capacity = Capacity::decode(image);
        let manufacturer = module_manufacturer(image);
        let part_number = decode_part_number(image);
        let die = infer_die(&part_number, manufacturer.name);
        let timings = TimingInfo::decode(image);
        let view = ParsedView {
            memory_type: MemoryType::from_code(image[DRAM_TYPE]),
            module_type: ModuleType::from_code(image[MODULE_TYPE]),
            header: SpdHeader::decode(image),
            die_description: describe_die(die.as_ref(), capacity.density_mbit),
            capacity,
            addressing: Addressing::decode(image),
            banks: BankTopology::decode(image),
            bus: BusWidth::decode(image),
            voltage: Voltage::decode(image),
            thermal_sensor: has_thermal_sensor(image),
            manufacturer,
            dram_manufacturer: dram_manufacturer(image),
            part_number,
            serial_number: decode_serial_number(image),
            manufacturing_date: ManufacturingDate::decode(image),
            manufacturing_location: manufacturing_location(image),
            module_revision: module_revision(image),
            dram_stepping: dram_stepping(image),
            speed_grade: speed_grade(read_timing_ps(image, TimingField::TckMin)),
            timing_string: timings.timing_string(),
            timings,
            cas_latencies: supported_cas_latencies(image),
            die,
            die_note: DIE_INFERENCE_NOTE,
            xmp: decode_xmp(image),
            crc: check_crc(image),
        };
        tracing::debug!(
            part = %view.part_number,
            capacity = %view.capacity.capacity,
            speed = view.speed_grade,
            "parsed spd image"
        );
        view
    }

    /// Derived CAS latency in cycles.
    pub fn cl(&self) -> u32 {
        self.timings.cl
    }

    pub fn crc_ok(&self) -> bool {
        self.crc.iter().all(|c| c.ok)
    }
}
