use hashbrown::{HashMap, HashSet};

use crate::device::{
    BindingTableHandle, BufferHandle, BufferImageCopy, CommandBufferHandle, DescriptorWrite,
    HostDevice, HostSamplerDesc, ImageDesc, ImageHandle, ImageLayout, SamplerHandle, SignalId,
    SignalStatus, ViewDesc, ViewHandle,
};
use crate::error::DeviceError;

#[derive(Clone, Debug)]
pub struct SoftImage {
    pub desc: ImageDesc,
    pub layout: ImageLayout,
    /// Bytes written by the most recent buffer→image copy.
    pub data: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordedBarrier {
    pub commands: CommandBufferHandle,
    pub image: ImageHandle,
    pub old_layout: ImageLayout,
    pub new_layout: ImageLayout,
}

/// CPU-only [`HostDevice`].
///
/// Handles are never reused, so a stale handle always fails lookup.
#[derive(Debug)]
pub struct SoftDevice {
    next_id: u64,
    images: HashMap<u64, SoftImage>,
    views: HashMap<u64, (ImageHandle, ViewDesc)>,
    samplers: HashMap<u64, HostSamplerDesc>,
    buffers: HashMap<u64, Vec<u8>>,
    tables: HashMap<u64, Vec<DescriptorWrite>>,
    binding_table_capacity: usize,
    fired: HashSet<u64>,
    barriers: Vec<RecordedBarrier>,
    fail_image_allocations: bool,
}

impl Default for SoftDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftDevice {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            images: HashMap::new(),
            views: HashMap::new(),
            samplers: HashMap::new(),
            buffers: HashMap::new(),
            tables: HashMap::new(),
            binding_table_capacity: usize::MAX,
            fired: HashSet::new(),
            barriers: Vec::new(),
            fail_image_allocations: false,
        }
    }

    pub fn with_binding_table_capacity(mut self, capacity: usize) -> Self {
        self.binding_table_capacity = capacity;
        self
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Returns a fresh, pending completion signal.
    pub fn new_signal(&mut self) -> SignalId {
        SignalId(self.alloc_id())
    }

    pub fn fire(&mut self, signal: SignalId) {
        self.fired.insert(signal.0);
    }

    pub fn set_fail_image_allocations(&mut self, fail: bool) {
        self.fail_image_allocations = fail;
    }

    pub fn image(&self, image: ImageHandle) -> Option<&SoftImage> {
        self.images.get(&image.0)
    }

    pub fn view(&self, view: ViewHandle) -> Option<&(ImageHandle, ViewDesc)> {
        self.views.get(&view.0)
    }

    pub fn sampler(&self, sampler: SamplerHandle) -> Option<&HostSamplerDesc> {
        self.samplers.get(&sampler.0)
    }

    pub fn binding_table(&self, table: BindingTableHandle) -> Option<&[DescriptorWrite]> {
        self.tables.get(&table.0).map(Vec::as_slice)
    }

    pub fn barriers(&self) -> &[RecordedBarrier] {
        &self.barriers
    }

    pub fn live_images(&self) -> usize {
        self.images.len()
    }

    pub fn live_views(&self) -> usize {
        self.views.len()
    }

    pub fn live_samplers(&self) -> usize {
        self.samplers.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_binding_tables(&self) -> usize {
        self.tables.len()
    }
}

fn invalid(kind: &'static str, id: u64) -> DeviceError {
    DeviceError::InvalidHandle { kind, id }
}

impl HostDevice for SoftDevice {
    fn create_image(&mut self, desc: &ImageDesc) -> Result<ImageHandle, DeviceError> {
        if self.fail_image_allocations {
            return Err(DeviceError::OutOfMemory);
        }
        let id = self.alloc_id();
        self.images.insert(
            id,
            SoftImage {
                desc: *desc,
                layout: ImageLayout::Undefined,
                data: Vec::new(),
            },
        );
        Ok(ImageHandle(id))
    }

    fn destroy_image(&mut self, image: ImageHandle) {
        self.images.remove(&image.0);
    }

    fn create_view(&mut self, image: ImageHandle, desc: &ViewDesc) -> Result<ViewHandle, DeviceError> {
        if !self.images.contains_key(&image.0) {
            return Err(invalid("image", image.0));
        }
        let id = self.alloc_id();
        self.views.insert(id, (image, *desc));
        Ok(ViewHandle(id))
    }

    fn destroy_view(&mut self, view: ViewHandle) {
        self.views.remove(&view.0);
    }

    fn create_sampler(&mut self, desc: &HostSamplerDesc) -> Result<SamplerHandle, DeviceError> {
        let id = self.alloc_id();
        self.samplers.insert(id, *desc);
        Ok(SamplerHandle(id))
    }

    fn destroy_sampler(&mut self, sampler: SamplerHandle) {
        self.samplers.remove(&sampler.0);
    }

    fn create_staging_buffer(&mut self, size: u64) -> Result<BufferHandle, DeviceError> {
        let size = usize::try_from(size).map_err(|_| DeviceError::OutOfMemory)?;
        let id = self.alloc_id();
        self.buffers.insert(id, vec![0; size]);
        Ok(BufferHandle(id))
    }

    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) -> Result<(), DeviceError> {
        let bytes = self
            .buffers
            .get_mut(&buffer.0)
            .ok_or_else(|| invalid("buffer", buffer.0))?;
        let start = usize::try_from(offset).map_err(|_| DeviceError::OutOfBounds("buffer write"))?;
        let dst = bytes
            .get_mut(start..start + data.len())
            .ok_or(DeviceError::OutOfBounds("buffer write"))?;
        dst.copy_from_slice(data);
        Ok(())
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(&buffer.0);
    }

    fn cmd_image_barrier(
        &mut self,
        commands: CommandBufferHandle,
        image: ImageHandle,
        old_layout: ImageLayout,
        new_layout: ImageLayout,
    ) -> Result<(), DeviceError> {
        let target = self
            .images
            .get_mut(&image.0)
            .ok_or_else(|| invalid("image", image.0))?;
        target.layout = new_layout;
        self.barriers.push(RecordedBarrier {
            commands,
            image,
            old_layout,
            new_layout,
        });
        Ok(())
    }

    fn cmd_copy_buffer_to_image(
        &mut self,
        _commands: CommandBufferHandle,
        buffer: BufferHandle,
        image: ImageHandle,
        region: &BufferImageCopy,
    ) -> Result<(), DeviceError> {
        let bytes = self.buffers.get(&buffer.0).ok_or_else(|| invalid("buffer", buffer.0))?;
        let start = usize::try_from(region.buffer_offset)
            .map_err(|_| DeviceError::OutOfBounds("copy source"))?;
        let len = usize::try_from(region.size).map_err(|_| DeviceError::OutOfBounds("copy source"))?;
        let src = bytes
            .get(start..start + len)
            .ok_or(DeviceError::OutOfBounds("copy source"))?;

        let target = self
            .images
            .get_mut(&image.0)
            .ok_or_else(|| invalid("image", image.0))?;
        if target.layout != ImageLayout::TransferDst {
            return Err(DeviceError::WrongLayout(image.0));
        }
        target.data = src.to_vec();
        Ok(())
    }

    fn allocate_binding_table(&mut self) -> Result<BindingTableHandle, DeviceError> {
        if self.tables.len() >= self.binding_table_capacity {
            return Err(DeviceError::PoolExhausted);
        }
        let id = self.alloc_id();
        self.tables.insert(id, Vec::new());
        Ok(BindingTableHandle(id))
    }

    fn update_binding_table(
        &mut self,
        table: BindingTableHandle,
        writes: &[DescriptorWrite],
    ) -> Result<(), DeviceError> {
        let entries = self
            .tables
            .get_mut(&table.0)
            .ok_or_else(|| invalid("binding table", table.0))?;
        entries.extend_from_slice(writes);
        Ok(())
    }

    fn free_binding_table(&mut self, table: BindingTableHandle) {
        self.tables.remove(&table.0);
    }

    fn signal_status(&self, signal: SignalId) -> SignalStatus {
        if self.fired.contains(&signal.0) {
            SignalStatus::Fired
        } else {
            SignalStatus::Pending
        }
    }
}
