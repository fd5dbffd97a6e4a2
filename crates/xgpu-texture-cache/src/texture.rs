use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use xgpu_xenos::TextureDescription;

use crate::device::{HostFormat, ImageHandle, ImageLayout, SignalId, ViewHandle};
use crate::guest_memory::WatchHandle;

slotmap::new_key_type! {
    /// Generation-checked identity of a cached texture.
    pub struct TextureKey;
    pub struct SamplerKey;
}

/// Which container currently owns a texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureLocation {
    Main,
    Resolve,
    PendingDelete,
}

/// Texel offset of a probe address inside a matched texture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Offset2d {
    pub x: u32,
    pub y: u32,
}

/// Watch state shared with the write-watch callback.
///
/// The callback runs on a foreign thread and touches nothing else of the
/// texture.
#[derive(Debug, Default)]
pub struct WatchState {
    /// Raw [`WatchHandle`]; 0 when no watch is registered.
    handle: AtomicU64,
    pending_invalidation: AtomicBool,
}

impl WatchState {
    pub fn handle(&self) -> Option<WatchHandle> {
        WatchHandle::from_raw(self.handle.load(Ordering::Acquire))
    }

    pub fn is_pending_invalidation(&self) -> bool {
        self.pending_invalidation.load(Ordering::Acquire)
    }

    pub(crate) fn take_handle(&self) -> Option<WatchHandle> {
        WatchHandle::from_raw(self.handle.swap(0, Ordering::AcqRel))
    }

    pub(crate) fn store_handle(&self, handle: WatchHandle) {
        self.handle.store(handle.to_raw(), Ordering::Release);
    }

    /// Watch callback side: the handle is cleared before anything else.
    pub(crate) fn mark_touched(&self) {
        self.handle.store(0, Ordering::Release);
        self.pending_invalidation.store(true, Ordering::Release);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureView {
    pub swizzle: u16,
    pub view: ViewHandle,
}

#[derive(Debug)]
pub struct Texture {
    pub(crate) description: TextureDescription,
    pub(crate) image: ImageHandle,
    pub(crate) format: HostFormat,
    pub(crate) layout: ImageLayout,
    pub(crate) views: Vec<TextureView>,
    pub(crate) is_full_texture: bool,
    pub(crate) in_flight: Option<SignalId>,
    pub(crate) location: TextureLocation,
    pub(crate) watch: Arc<WatchState>,
}

impl Texture {
    pub fn description(&self) -> &TextureDescription {
        &self.description
    }

    pub fn image(&self) -> ImageHandle {
        self.image
    }

    pub fn format(&self) -> HostFormat {
        self.format
    }

    pub fn layout(&self) -> ImageLayout {
        self.layout
    }

    pub fn views(&self) -> &[TextureView] {
        &self.views
    }

    /// False for provisional resolve targets that have not been promoted.
    pub fn is_full_texture(&self) -> bool {
        self.is_full_texture
    }

    /// Completion signal of the last submission that reads this texture.
    pub fn in_flight(&self) -> Option<SignalId> {
        self.in_flight
    }

    pub fn location(&self) -> TextureLocation {
        self.location
    }

    pub fn watch(&self) -> &WatchState {
        &self.watch
    }
}
