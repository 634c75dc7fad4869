//! Change events and listener registration.

use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::Serialize;
use thiserror::Error;

/// A change to an [`SpdRecord`](crate::SpdRecord), delivered after the
/// record's state has been updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpdEvent {
    /// A new image and baseline replaced the previous contents.
    DataLoaded,
    ByteChanged { offset: usize, old: u8, new: u8 },
    /// One atomic multi-byte write covering `offset..offset + length`.
    RangeChanged { offset: usize, length: usize },
    /// The image was restored from its baseline or cleared.
    DataReset,
}

/// Failure reported by a listener. Logged and dropped by the record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("listener failed: {0}")]
pub struct ListenerError(pub String);

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        ListenerError(message.into())
    }
}

/// Receives change events from a record.
pub trait SpdListener {
    fn on_event(&mut self, event: &SpdEvent) -> Result<(), ListenerError>;
}

impl<F> SpdListener for F
where
    F: FnMut(&SpdEvent) -> Result<(), ListenerError>,
{
    fn on_event(&mut self, event: &SpdEvent) -> Result<(), ListenerError> {
        self(event)
    }
}

/// Handle returned on registration, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, Box<dyn SpdListener>)>,
}

impl Listeners {
    pub(crate) fn add(&mut self, listener: Box<dyn SpdListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Delivers `event` to every listener in registration order. A listener
    /// that errors or panics is logged and the rest still run.
    pub(crate) fn notify(&mut self, event: &SpdEvent) {
        for (id, listener) in &mut self.entries {
            match catch_unwind(AssertUnwindSafe(|| listener.on_event(event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::warn!(listener = ?id, ?event, %err, "listener returned an error");
                }
                Err(_) => {
                    tracing::warn!(listener = ?id, ?event, "listener panicked");
                }
            }
        }
    }
}
