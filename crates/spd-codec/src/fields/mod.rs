//! Field codec: decoders and encoders for every non-timing SPD field.

pub mod geometry;
pub mod identity;
pub mod manufacturer;

pub use geometry::{
    Addressing, BankTopology, BusWidth, Capacity, MemoryType, ModuleType, Package, SpdHeader,
    Voltage,
};
pub use identity::{parse_manufacturing_date, DateInput, ManufacturingDate};
pub use manufacturer::{encode_manufacturer, Manufacturer};
