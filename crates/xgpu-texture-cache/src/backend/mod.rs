//! Host device backends.
//!
//! Production embedders implement [`crate::HostDevice`] over their graphics
//! API. For tests we provide a deterministic software device that executes
//! copies immediately and lets the caller fire completion signals by hand.

mod soft;

pub use soft::{RecordedBarrier, SoftDevice, SoftImage};
