//! Fence-aware staging ring for texture uploads.
//!
//! Allocations are carved out of one host-visible device buffer in submission
//! order. Each allocation is tagged with the completion signal of the
//! submission that reads it and is reclaimed by [`StagingBuffer::scavenge`]
//! once that signal fires.

use std::collections::VecDeque;

use crate::device::{BufferHandle, HostDevice, SignalId};
use crate::error::{DeviceError, StagingError};

/// Round `value` up to the nearest multiple of `alignment`.
///
/// `alignment` must be > 0.
pub(crate) fn align_up(value: u64, alignment: u64) -> u64 {
    debug_assert!(alignment > 0);
    let add = alignment - 1;
    match value.checked_add(add) {
        Some(v) => v / alignment * alignment,
        None => u64::MAX / alignment * alignment,
    }
}

/// A sub-range of the staging buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StagingRegion {
    pub offset: u64,
    /// Requested size (unpadded).
    pub size: u64,
}

#[derive(Clone, Copy, Debug)]
struct InFlight {
    offset: u64,
    size: u64,
    signal: SignalId,
}

#[derive(Debug)]
pub struct StagingBuffer {
    buffer: BufferHandle,
    /// Host mirror of the buffer; flushed ranges are pushed to the device.
    host: Vec<u8>,
    capacity: u64,
    alignment: u64,
    head: u64,
    in_flight: VecDeque<InFlight>,
}

impl StagingBuffer {
    pub fn new<D: HostDevice + ?Sized>(
        device: &mut D,
        capacity: u64,
        alignment: u64,
    ) -> Result<Self, DeviceError> {
        let buffer = device.create_staging_buffer(capacity)?;
        let host_len = usize::try_from(capacity).map_err(|_| DeviceError::OutOfMemory)?;
        Ok(Self {
            buffer,
            host: vec![0; host_len],
            capacity,
            alignment: alignment.max(1),
            head: 0,
            in_flight: VecDeque::new(),
        })
    }

    pub fn buffer(&self) -> BufferHandle {
        self.buffer
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Offset at which `padded` bytes would be placed, if they fit.
    fn placement(&self, padded: u64) -> Option<u64> {
        let Some(oldest) = self.in_flight.front() else {
            return (padded <= self.capacity).then_some(0);
        };
        let tail = oldest.offset;
        if self.head > tail {
            // Live data is [tail, head); free space at the end, then at the front.
            if self.head + padded <= self.capacity {
                Some(self.head)
            } else if padded <= tail {
                Some(0)
            } else {
                None
            }
        } else if self.head + padded <= tail {
            // Wrapped: live data is [tail, capacity) and [0, head).
            Some(self.head)
        } else {
            None
        }
    }

    pub fn can_acquire(&self, size: u64) -> bool {
        let padded = align_up(size.max(1), self.alignment);
        self.placement(padded).is_some()
    }

    /// Reserves `size` bytes that stay live until `signal` fires.
    pub fn acquire(&mut self, size: u64, signal: SignalId) -> Result<StagingRegion, StagingError> {
        let padded = align_up(size.max(1), self.alignment);
        if padded > self.capacity {
            return Err(StagingError::TooLarge {
                requested: size,
                capacity: self.capacity,
            });
        }
        let offset = self
            .placement(padded)
            .ok_or(StagingError::Exhausted { requested: size })?;

        self.head = offset + padded;
        self.in_flight.push_back(InFlight {
            offset,
            size: padded,
            signal,
        });
        Ok(StagingRegion { offset, size })
    }

    /// Host-writable bytes of `region`.
    pub fn host_mut(&mut self, region: &StagingRegion) -> &mut [u8] {
        let start = region.offset as usize;
        &mut self.host[start..start + region.size as usize]
    }

    /// Pushes host writes to `region` to the device buffer.
    pub fn flush<D: HostDevice + ?Sized>(
        &self,
        device: &mut D,
        region: &StagingRegion,
    ) -> Result<(), DeviceError> {
        let start = region.offset as usize;
        device.write_buffer(
            self.buffer,
            region.offset,
            &self.host[start..start + region.size as usize],
        )
    }

    /// Releases allocations whose signal has fired, oldest first.
    ///
    /// Returns the number of allocations released.
    pub fn scavenge<D: HostDevice + ?Sized>(&mut self, device: &D) -> usize {
        let mut released = 0;
        while let Some(front) = self.in_flight.front() {
            if !device.signal_fired(front.signal) {
                break;
            }
            self.in_flight.pop_front();
            released += 1;
        }
        if self.in_flight.is_empty() {
            self.head = 0;
        }
        released
    }

    pub fn destroy<D: HostDevice + ?Sized>(self, device: &mut D) {
        device.destroy_buffer(self.buffer);
    }

    #[cfg(test)]
    fn live_bytes(&self) -> u64 {
        self.in_flight.iter().map(|a| a.size).sum()
    }
}
