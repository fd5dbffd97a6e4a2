//! Cross-thread invalidation plumbing.
//!
//! Write-watch callbacks run on whatever thread touched guest memory. They
//! only flag the texture's [`WatchState`] and push its key onto a
//! [`PendingInvalidations`] queue; the render thread swaps the queue out
//! during scavenging and does all real work there.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::trace;
use xgpu_xenos::TextureDescription;

use crate::guest_memory::GuestMemory;
use crate::texture::{TextureKey, WatchState};

/// Mutex-guarded list of touched textures with single-consumer swap.
#[derive(Debug, Default)]
pub struct PendingInvalidations {
    inner: Mutex<Vec<TextureKey>>,
}

impl PendingInvalidations {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TextureKey>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn push(&self, key: TextureKey) {
        self.lock().push(key);
    }

    /// Exchanges the active list with `spare`, which must be empty.
    ///
    /// The lock is held only for the exchange; the caller processes the
    /// returned entries in `spare` afterwards.
    pub fn swap(&self, spare: &mut Vec<TextureKey>) {
        debug_assert!(spare.is_empty());
        std::mem::swap(&mut *self.lock(), spare);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cancels the registered watch, if any.
pub(crate) fn cancel_watch(memory: &dyn GuestMemory, state: &WatchState) {
    if let Some(handle) = state.take_handle() {
        memory.cancel_write_watch(handle);
    }
}

/// Watches `description`'s guest range, replacing any previous watch.
///
/// A stale handle stored after a racing fire is harmless: cancelling a fired
/// watch is a no-op.
pub(crate) fn register_watch(
    memory: &dyn GuestMemory,
    key: TextureKey,
    description: &TextureDescription,
    state: &Arc<WatchState>,
    queue: &Arc<PendingInvalidations>,
) {
    cancel_watch(memory, state);

    let callback_state = Arc::clone(state);
    let callback_queue = Arc::clone(queue);
    let handle = memory.add_write_watch(
        description.guest_address,
        description.input_length,
        Box::new(move |address| {
            callback_state.mark_touched();
            callback_queue.push(key);
            trace!(?key, address, "texture memory touched");
        }),
    );
    state.store_handle(handle);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guest_memory::VecGuestMemory;
    use slotmap::SlotMap;
    use xgpu_xenos::{Endian, TextureFormat};

    fn key() -> TextureKey {
        let mut map: SlotMap<TextureKey, ()> = SlotMap::with_key();
        map.insert(())
    }

    fn description() -> TextureDescription {
        TextureDescription::new_2d(0x1000, 64, 64, TextureFormat::K8_8_8_8, Endian::None, false)
            .unwrap()
    }

    #[test]
    fn swap_hands_over_pending_entries() {
        let queue = PendingInvalidations::new();
        let k = key();
        queue.push(k);
        let mut spare = Vec::new();
        queue.swap(&mut spare);
        assert_eq!(spare, vec![k]);
        assert!(queue.is_empty());
    }

    #[test]
    fn touched_watch_clears_handle_flags_and_enqueues() {
        let memory = VecGuestMemory::new(0x20000);
        let state = Arc::new(WatchState::default());
        let queue = Arc::new(PendingInvalidations::new());
        let k = key();

        register_watch(&memory, k, &description(), &state, &queue);
        assert!(state.handle().is_some());
        memory.write(0x1004, &[0xff]).unwrap();

        assert!(state.handle().is_none());
        assert!(state.is_pending_invalidation());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn re_registration_cancels_the_previous_watch() {
        let memory = VecGuestMemory::new(0x20000);
        let state = Arc::new(WatchState::default());
        let queue = Arc::new(PendingInvalidations::new());
        let k = key();

        register_watch(&memory, k, &description(), &state, &queue);
        register_watch(&memory, k, &description(), &state, &queue);
        assert_eq!(memory.active_watches(), 1);

        memory.write(0x1000, &[1]).unwrap();
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn callbacks_from_many_threads_all_arrive() {
        let memory = Arc::new(VecGuestMemory::new(0x100000));
        let queue = Arc::new(PendingInvalidations::new());
        let mut map: SlotMap<TextureKey, ()> = SlotMap::with_key();
        for i in 0..8u32 {
            let desc = TextureDescription::new_2d(
                0x10000 * (i + 1),
                64,
                64,
                TextureFormat::K8_8_8_8,
                Endian::None,
                false,
            )
            .unwrap();
            let state = Arc::new(WatchState::default());
            register_watch(&*memory, map.insert(()), &desc, &state, &queue);
        }

        let threads: Vec<_> = (0..8u32)
            .map(|i| {
                let memory = Arc::clone(&memory);
                std::thread::spawn(move || memory.write(0x10000 * (i + 1), &[1]).unwrap())
            })
            .collect();
        for thread in threads {
            thread.join().expect("thread join");
        }

        let mut spare = Vec::new();
        queue.swap(&mut spare);
        assert_eq!(spare.len(), 8);
    }
}
