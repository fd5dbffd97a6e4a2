/// Construction parameters for [`crate::TextureCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureCacheConfig {
    /// Size of the host-visible staging ring used for uploads.
    pub staging_buffer_size: u64,
    /// Alignment of every staging allocation.
    pub staging_alignment: u64,
    /// Number of guest texture fetch slots addressable by a binding.
    pub max_fetch_slots: u32,
    /// Maximum number of binding tables in flight at once.
    pub binding_table_pool_size: u32,
}

impl Default for TextureCacheConfig {
    fn default() -> Self {
        Self {
            staging_buffer_size: 64 * 1024 * 1024,
            staging_alignment: 256,
            max_fetch_slots: xgpu_xenos::MAX_TEXTURE_FETCH_SLOTS,
            binding_table_pool_size: 8192,
        }
    }
}
