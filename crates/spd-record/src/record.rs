//! The editable SPD record: current image, load baseline and dirty set.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use spd_studio_codec::{
    check_range, image_from_slice, is_ddr4, ParsedView, SpdError, SpdImage, SpdResult, SPD_SIZE,
};

use crate::event::{ListenerError, ListenerId, Listeners, SpdEvent, SpdListener};

/// Where the loaded image came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum Source {
    Device,
    File(PathBuf),
    #[default]
    Unknown,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Device => f.write_str("device"),
            Source::File(path) => write!(f, "{}", path.display()),
            Source::Unknown => f.write_str("unknown"),
        }
    }
}

impl From<Source> for String {
    fn from(value: Source) -> Self {
        value.to_string()
    }
}

/// Offset-ordered `offset -> (left, right)` byte pairs.
pub type ByteDiff = BTreeMap<usize, (u8, u8)>;

/// A 512-byte DDR4 SPD image under edit.
///
/// Invariant: `offset` is in the dirty set exactly when a baseline exists and
/// `image[offset] != baseline[offset]`. Every mutator keeps it before any
/// listener is notified.
pub struct SpdRecord {
    image: SpdImage,
    baseline: Option<SpdImage>,
    dirty: BTreeSet<usize>,
    source: Source,
    listeners: Listeners,
}

impl Default for SpdRecord {
    fn default() -> Self {
        SpdRecord {
            image: [0; SPD_SIZE],
            baseline: None,
            dirty: BTreeSet::new(),
            source: Source::Unknown,
            listeners: Listeners::default(),
        }
    }
}

impl fmt::Debug for SpdRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpdRecord")
            .field("source", &self.source)
            .field("has_baseline", &self.baseline.is_some())
            .field("dirty", &self.dirty)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl SpdRecord {
    /// An empty record: 512 zero bytes, no baseline.
    pub fn new() -> Self {
        SpdRecord::default()
    }

    pub fn from_bytes(bytes: &[u8], source: Source) -> SpdResult<Self> {
        let mut record = SpdRecord::new();
        record.load(bytes, source)?;
        Ok(record)
    }

    // ── Loading ───────────────────────────────────────────────────────────

    /// Replaces image and baseline with `bytes`, which must be exactly 512
    /// bytes. A failed load leaves the record untouched.
    pub fn load(&mut self, bytes: &[u8], source: Source) -> SpdResult<()> {
        let image = image_from_slice(bytes)?;
        self.image = image;
        self.baseline = Some(image);
        self.dirty.clear();
        self.source = source;
        tracing::info!(source = %self.source, ddr4 = is_ddr4(&self.image), "loaded spd image");
        self.emit(SpdEvent::DataLoaded);
        Ok(())
    }

    /// Restores the whole image from the baseline.
    pub fn reset(&mut self) -> SpdResult<()> {
        let baseline = self.baseline.ok_or(SpdError::NoBaseline)?;
        let restored = self.dirty.len();
        self.image = baseline;
        self.dirty.clear();
        tracing::info!(restored, "reset spd image to baseline");
        self.emit(SpdEvent::DataReset);
        Ok(())
    }

    /// Restores one byte from the baseline.
    pub fn reset_byte(&mut self, offset: usize) -> SpdResult<()> {
        check_range(offset, 1)?;
        let baseline = self.baseline.ok_or(SpdError::NoBaseline)?;
        self.set_byte(offset, baseline[offset])
    }

    /// Back to the empty state: zero image, no baseline, unknown source.
    pub fn clear(&mut self) {
        self.image = [0; SPD_SIZE];
        self.baseline = None;
        self.dirty.clear();
        self.source = Source::Unknown;
        tracing::info!("cleared spd record");
        self.emit(SpdEvent::DataReset);
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    pub fn image(&self) -> &SpdImage {
        &self.image
    }

    pub fn baseline(&self) -> Option<&SpdImage> {
        self.baseline.as_ref()
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn set_source(&mut self, source: Source) {
        self.source = source;
    }

    pub fn get_byte(&self, offset: usize) -> SpdResult<u8> {
        check_range(offset, 1)?;
        Ok(self.image[offset])
    }

    pub fn get_range(&self, offset: usize, len: usize) -> SpdResult<&[u8]> {
        check_range(offset, len)?;
        Ok(&self.image[offset..offset + len])
    }

    /// Baseline value at `offset`, `None` without a baseline or out of range.
    pub fn original_byte(&self, offset: usize) -> Option<u8> {
        self.baseline.and_then(|b| b.get(offset).copied())
    }

    pub fn is_byte_modified(&self, offset: usize) -> bool {
        self.dirty.contains(&offset)
    }

    pub fn modified_count(&self) -> usize {
        self.dirty.len()
    }

    pub fn is_modified(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Dirty offsets in ascending order.
    pub fn modified_offsets(&self) -> impl Iterator<Item = usize> + '_ {
        self.dirty.iter().copied()
    }

    /// True when any byte of the image is non-zero.
    pub fn has_data(&self) -> bool {
        self.image.iter().any(|&b| b != 0)
    }

    /// True when byte 2 marks the image as DDR4.
    pub fn is_valid(&self) -> bool {
        is_ddr4(&self.image)
    }

    /// `offset -> (original, current)` for every dirty byte.
    pub fn modifications(&self) -> ByteDiff {
        let Some(baseline) = &self.baseline else {
            return ByteDiff::new();
        };
        self.dirty
            .iter()
            .map(|&o| (o, (baseline[o], self.image[o])))
            .collect()
    }

    /// `offset -> (current, other)` wherever the current image differs from
    /// `other`, which must be a full 512-byte image.
    pub fn compare_with(&self, other: &[u8]) -> SpdResult<ByteDiff> {
        let other = image_from_slice(other)?;
        Ok(self
            .image
            .iter()
            .zip(other.iter())
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(o, (&a, &b))| (o, (a, b)))
            .collect())
    }

    /// Decodes the current image.
    pub fn parse(&self) -> SpdResult<ParsedView> {
        ParsedView::parse(&self.image)
    }

    // ── Writes ────────────────────────────────────────────────────────────

    /// Writes one byte. Writing the value already present is a no-op that
    /// emits nothing.
    pub fn set_byte(&mut self, offset: usize, value: u8) -> SpdResult<()> {
        check_range(offset, 1)?;
        let old = self.image[offset];
        if old == value {
            return Ok(());
        }
        self.image[offset] = value;
        self.track(offset);
        tracing::trace!(offset, old, new = value, "byte changed");
        self.emit(SpdEvent::ByteChanged {
            offset,
            old,
            new: value,
        });
        Ok(())
    }

    /// Writes `values` starting at `offset` as one change. The whole range
    /// is validated before any byte moves. Emits a single `RangeChanged`
    /// when at least one byte differs.
    pub fn set_range(&mut self, offset: usize, values: &[u8]) -> SpdResult<()> {
        check_range(offset, values.len())?;
        let window = &mut self.image[offset..offset + values.len()];
        if window == values {
            return Ok(());
        }
        window.copy_from_slice(values);
        for o in offset..offset + values.len() {
            self.track(o);
        }
        tracing::trace!(offset, length = values.len(), "range changed");
        self.emit(SpdEvent::RangeChanged {
            offset,
            length: values.len(),
        });
        Ok(())
    }

    /// [`set_range`](Self::set_range) for integer input, as typed into a hex
    /// editor. Every value must fit in a byte or nothing is written.
    pub fn write_values(&mut self, offset: usize, values: &[i64]) -> SpdResult<()> {
        check_range(offset, values.len())?;
        let bytes = values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                u8::try_from(v).map_err(|_| SpdError::OutOfRange {
                    field: format!("byte 0x{:03X}", offset + i),
                    detail: format!("{v} is outside 0..=255"),
                })
            })
            .collect::<SpdResult<Vec<u8>>>()?;
        self.set_range(offset, &bytes)
    }

    /// Runs codec encoders against a scratch copy of the image. On success
    /// the changed bytes are applied together and announced as one
    /// `RangeChanged` spanning the first to last changed offset; on failure
    /// the record is untouched. Returns the number of bytes changed.
    pub fn edit<F>(&mut self, f: F) -> SpdResult<usize>
    where
        F: FnOnce(&mut SpdImage) -> SpdResult<()>,
    {
        let mut scratch = self.image;
        f(&mut scratch)?;
        let changed: Vec<usize> = (0..SPD_SIZE)
            .filter(|&o| scratch[o] != self.image[o])
            .collect();
        let (Some(&first), Some(&last)) = (changed.first(), changed.last()) else {
            return Ok(0);
        };
        self.image = scratch;
        for &o in &changed {
            self.track(o);
        }
        tracing::debug!(first, last, count = changed.len(), "applied field edit");
        self.emit(SpdEvent::RangeChanged {
            offset: first,
            length: last - first + 1,
        });
        Ok(changed.len())
    }

    // ── Listeners ─────────────────────────────────────────────────────────

    pub fn add_listener<L>(&mut self, listener: L) -> ListenerId
    where
        L: SpdListener + 'static,
    {
        self.listeners.add(Box::new(listener))
    }

    /// Registers an infallible callback.
    pub fn on_change<F>(&mut self, mut f: F) -> ListenerId
    where
        F: FnMut(&SpdEvent) + 'static,
    {
        self.add_listener(move |event: &SpdEvent| -> Result<(), ListenerError> {
            f(event);
            Ok(())
        })
    }

    /// Removes a listener. Returns false when `id` was not registered.
    pub fn off_change(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn track(&mut self, offset: usize) {
        match &self.baseline {
            Some(baseline) if baseline[offset] != self.image[offset] => {
                self.dirty.insert(offset);
            }
            _ => {
                self.dirty.remove(&offset);
            }
        }
    }

    fn emit(&mut self, event: SpdEvent) {
        self.listeners.notify(&event);
    }
}
