//! Guest memory as seen by the cache: reads plus one-shot write watches.
//!
//! The emulator will provide an implementation backed by its MMU. For tests we
//! provide [`VecGuestMemory`], which fires watches synchronously from whatever
//! thread performs the write.

use core::fmt;
use std::collections::BTreeMap;
use std::num::NonZeroU64;
use std::sync::{Mutex, MutexGuard};

use crate::error::GuestMemoryError;

/// Invoked once with the written guest address.
pub type WatchCallback = Box<dyn FnOnce(u32) + Send>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WatchHandle(NonZeroU64);

impl WatchHandle {
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    pub fn to_raw(self) -> u64 {
        self.0.get()
    }
}

pub trait GuestMemory: Send + Sync {
    fn read(&self, address: u32, dst: &mut [u8]) -> Result<(), GuestMemoryError>;

    /// Registers a one-shot write watch over `[base, base + length)`.
    ///
    /// The callback may run on any thread. It must not be invoked while the
    /// implementation holds a lock that `add_write_watch` or
    /// `cancel_write_watch` would take.
    fn add_write_watch(&self, base: u32, length: u32, callback: WatchCallback) -> WatchHandle;

    /// Cancels a watch. Handles that already fired or were canceled are
    /// ignored.
    fn cancel_write_watch(&self, handle: WatchHandle);
}

struct Watch {
    base: u64,
    end: u64,
    callback: WatchCallback,
}

struct Inner {
    bytes: Vec<u8>,
    watches: BTreeMap<u64, Watch>,
    next_handle: NonZeroU64,
}

/// Contiguous in-memory guest RAM starting at guest address 0.
pub struct VecGuestMemory {
    inner: Mutex<Inner>,
}

impl fmt::Debug for VecGuestMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("VecGuestMemory")
            .field("size", &inner.bytes.len())
            .field("watches", &inner.watches.len())
            .finish()
    }
}

impl VecGuestMemory {
    pub fn new(size_bytes: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                bytes: vec![0u8; size_bytes],
                watches: BTreeMap::new(),
                next_handle: NonZeroU64::MIN,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Writes guest memory, firing every watch overlapping the written range.
    ///
    /// Callbacks run on the calling thread after the internal lock is released.
    pub fn write(&self, address: u32, data: &[u8]) -> Result<(), GuestMemoryError> {
        let start = address as u64;
        let end = start + data.len() as u64;
        let fired: Vec<WatchCallback> = {
            let mut inner = self.lock();
            let slice = inner
                .bytes
                .get_mut(start as usize..end as usize)
                .ok_or(GuestMemoryError {
                    address,
                    len: data.len(),
                })?;
            slice.copy_from_slice(data);

            let hits: Vec<u64> = inner
                .watches
                .iter()
                .filter(|(_, watch)| watch.base < end && start < watch.end)
                .map(|(&handle, _)| handle)
                .collect();
            hits.iter()
                .filter_map(|handle| inner.watches.remove(handle))
                .map(|watch| watch.callback)
                .collect()
        };

        for callback in fired {
            callback(address);
        }
        Ok(())
    }

    pub fn active_watches(&self) -> usize {
        self.lock().watches.len()
    }
}

impl GuestMemory for VecGuestMemory {
    fn read(&self, address: u32, dst: &mut [u8]) -> Result<(), GuestMemoryError> {
        let inner = self.lock();
        let start = address as usize;
        let src = inner
            .bytes
            .get(start..start + dst.len())
            .ok_or(GuestMemoryError {
                address,
                len: dst.len(),
            })?;
        dst.copy_from_slice(src);
        Ok(())
    }

    fn add_write_watch(&self, base: u32, length: u32, callback: WatchCallback) -> WatchHandle {
        let mut inner = self.lock();
        let handle = inner.next_handle;
        inner.next_handle = handle.saturating_add(1);
        inner.watches.insert(
            handle.get(),
            Watch {
                base: base as u64,
                end: base as u64 + length as u64,
                callback,
            },
        );
        WatchHandle(handle)
    }

    fn cancel_write_watch(&self, handle: WatchHandle) {
        self.lock().watches.remove(&handle.to_raw());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn counting_watch(mem: &VecGuestMemory, base: u32, len: u32) -> (WatchHandle, Arc<AtomicU32>) {
        let hits = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&hits);
        let handle = mem.add_write_watch(
            base,
            len,
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        (handle, hits)
    }

    #[test]
    fn overlapping_write_fires_once() {
        let mem = VecGuestMemory::new(0x2000);
        let (_, hits) = counting_watch(&mem, 0x1000, 0x100);
        mem.write(0x0ff0, &[0; 0x20]).unwrap();
        mem.write(0x1010, &[1]).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(mem.active_watches(), 0);
    }

    #[test]
    fn disjoint_write_does_not_fire() {
        let mem = VecGuestMemory::new(0x2000);
        let (_, hits) = counting_watch(&mem, 0x1000, 0x100);
        mem.write(0x1100, &[1, 2, 3]).unwrap();
        mem.write(0x0f00, &[0; 0x100]).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(mem.active_watches(), 1);
    }

    #[test]
    fn canceled_watch_never_fires_and_double_cancel_is_harmless() {
        let mem = VecGuestMemory::new(0x2000);
        let (handle, hits) = counting_watch(&mem, 0, 0x10);
        mem.cancel_write_watch(handle);
        mem.cancel_write_watch(handle);
        mem.write(0, &[1]).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn callback_may_register_a_new_watch() {
        let mem = Arc::new(VecGuestMemory::new(0x100));
        let inner = Arc::clone(&mem);
        mem.add_write_watch(
            0,
            4,
            Box::new(move |_| {
                inner.add_write_watch(0, 4, Box::new(|_| {}));
            }),
        );
        mem.write(0, &[9]).unwrap();
        assert_eq!(mem.active_watches(), 1);
    }

    #[test]
    fn reads_round_trip_and_bounds_are_checked() {
        let mem = VecGuestMemory::new(16);
        mem.write(4, &[1, 2, 3]).unwrap();
        let mut out = [0; 3];
        mem.read(4, &mut out).unwrap();
        assert_eq!(out, [1, 2, 3]);
        assert_eq!(
            mem.read(15, &mut [0; 2]),
            Err(GuestMemoryError { address: 15, len: 2 })
        );
    }
}
