//! Editable DDR4 SPD record.
//!
//! [`SpdRecord`] owns one 512-byte image together with the baseline it was
//! loaded from, tracks which bytes differ from that baseline and notifies
//! registered listeners after every change.
//!
//! # Overview
//!
//! - [`SpdRecord`] - Image, baseline, dirty set and mutators
//! - [`SpdEvent`] / [`SpdListener`] - Change notifications
//! - [`export`] - JSON export and plain-text report
//!
//! # Example
//!
//! ```
//! use spd_studio_record::{Source, SpdEvent, SpdRecord};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let mut bytes = vec![0u8; 512];
//! bytes[2] = 0x0C;
//! let mut record = SpdRecord::from_bytes(&bytes, Source::Unknown).unwrap();
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&seen);
//! record.on_change(move |ev| sink.borrow_mut().push(*ev));
//!
//! record.set_byte(18, 5).unwrap();
//! assert!(record.is_byte_modified(18));
//! assert_eq!(
//!     seen.borrow().as_slice(),
//!     &[SpdEvent::ByteChanged { offset: 18, old: 0, new: 5 }]
//! );
//! ```

mod event;
pub mod export;
mod record;

pub use event::{ListenerError, ListenerId, SpdEvent, SpdListener};
pub use export::{text_report, to_json};
pub use record::{ByteDiff, Source, SpdRecord};
