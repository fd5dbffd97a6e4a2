//! Host device capability surface.
//!
//! The cache never talks to a graphics API directly. Everything it needs from
//! the host (images, views, samplers, a staging buffer, command recording,
//! binding tables and completion signals) goes through [`HostDevice`].

use bitflags::bitflags;
use xgpu_xenos::{AnisoFilter, ClampMode, Dimension, SamplerDescription, TextureFilter, TextureFormat};

use crate::error::{DeviceError, SamplerError};

macro_rules! handles {
    ($($(#[$meta:meta])* $name:ident;)*) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub u64);
        )*
    };
}

handles! {
    ImageHandle;
    ViewHandle;
    SamplerHandle;
    BufferHandle;
    BindingTableHandle;
    /// Command stream the cache records upload work into.
    CommandBufferHandle;
    /// Completion signal of a device submission.
    SignalId;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalStatus {
    Pending,
    Fired,
}

/// Host memory layout of an image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ImageLayout {
    #[default]
    Undefined,
    TransferDst,
    ShaderReadOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentSwizzle {
    R,
    G,
    B,
    A,
    Zero,
    One,
    Identity,
}

impl ComponentSwizzle {
    /// Decodes one 3-bit guest selector. Selector 7 has no guest meaning and
    /// maps to identity, like 6.
    pub fn from_guest(bits: u16) -> Self {
        match bits & 0x7 {
            0 => Self::R,
            1 => Self::G,
            2 => Self::B,
            3 => Self::A,
            4 => Self::Zero,
            5 => Self::One,
            _ => Self::Identity,
        }
    }
}

/// Host component mapping for a packed guest swizzle (`x` in the low bits).
pub fn component_mapping(swizzle: u16) -> [ComponentSwizzle; 4] {
    [0, 3, 6, 9].map(|shift| ComponentSwizzle::from_guest(swizzle >> shift))
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ImageUsage: u32 {
        const SAMPLED = 1 << 0;
        const TRANSFER_SRC = 1 << 1;
        const TRANSFER_DST = 1 << 2;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostFormat {
    R8Unorm,
    R8G8Unorm,
    R5G6B5Unorm,
    R5G5B5A1Unorm,
    R4G4B4A4Unorm,
    R8G8B8A8Unorm,
    A2R10G10B10Unorm,
    B10G11R11Ufloat,
    D24UnormS8Uint,
    R16Unorm,
    R16G16Unorm,
    R16G16B16A16Unorm,
    R16Sfloat,
    R16G16Sfloat,
    R16G16B16A16Sfloat,
    R32Sint,
    R32G32Sint,
    R32G32B32A32Sint,
    R32Sfloat,
    R32G32Sfloat,
    R32G32B32Sfloat,
    R32G32B32A32Sfloat,
    Bc1RgbaSrgb,
    Bc1RgbUnorm,
    Bc2Srgb,
    Bc2Unorm,
    Bc3Srgb,
    Bc3Unorm,
    Bc5Unorm,
}

/// Host equivalent of a guest format, if one exists.
pub fn host_format(format: TextureFormat) -> Option<HostFormat> {
    use HostFormat as H;
    use TextureFormat as G;
    Some(match format {
        G::K8 => H::R8Unorm,
        G::K1_5_5_5 => H::R5G5B5A1Unorm,
        G::K5_6_5 => H::R5G6B5Unorm,
        G::K8_8_8_8 | G::K8_8_8_8As16_16_16_16 => H::R8G8B8A8Unorm,
        G::K2_10_10_10 | G::K2_10_10_10As16_16_16_16 => H::A2R10G10B10Unorm,
        G::K8_8 => H::R8G8Unorm,
        G::K4_4_4_4 => H::R4G4B4A4Unorm,
        G::K10_11_11 | G::K11_11_10 => H::B10G11R11Ufloat,
        G::K10_11_11As16_16_16_16 | G::K11_11_10As16_16_16_16 => H::B10G11R11Ufloat,
        G::Dxt1 => H::Bc1RgbaSrgb,
        G::Dxt2_3 => H::Bc2Srgb,
        G::Dxt4_5 => H::Bc3Srgb,
        G::Dxt1As16_16_16_16 => H::Bc1RgbUnorm,
        G::Dxt2_3As16_16_16_16 => H::Bc2Unorm,
        G::Dxt4_5As16_16_16_16 => H::Bc3Unorm,
        G::Dxn => H::Bc5Unorm,
        G::K24_8 | G::K24_8Float => H::D24UnormS8Uint,
        G::K16 | G::K16Expand => H::R16Unorm,
        G::K16_16 | G::K16_16Expand => H::R16G16Unorm,
        G::K16_16_16_16 | G::K16_16_16_16Expand => H::R16G16B16A16Unorm,
        G::K16Float => H::R16Sfloat,
        G::K16_16Float => H::R16G16Sfloat,
        G::K16_16_16_16Float => H::R16G16B16A16Sfloat,
        G::K32 => H::R32Sint,
        G::K32_32 => H::R32G32Sint,
        G::K32_32_32_32 => H::R32G32B32A32Sint,
        G::K32Float => H::R32Sfloat,
        G::K32_32Float => H::R32G32Sfloat,
        G::K32_32_32Float => H::R32G32B32Sfloat,
        G::K32_32_32_32Float => H::R32G32B32A32Sfloat,
        G::K1Reverse
        | G::K1
        | G::K6_5_5
        | G::K8A
        | G::K8B
        | G::CrY1CbY0
        | G::Y1CrY0Cb
        | G::K8_8_8_8A
        | G::K32As8
        | G::K32As8_8
        | G::K16Mpeg
        | G::K16_16Mpeg
        | G::K8Interlaced
        | G::K32As8Interlaced
        | G::K32As8_8Interlaced
        | G::K16Interlaced
        | G::K16MpegInterlaced
        | G::K16_16MpegInterlaced
        | G::Dxt3A
        | G::Dxt5A
        | G::Ctx1
        | G::Dxt3AAs1_1_1_1 => return None,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageDesc {
    pub dimension: Dimension,
    pub format: HostFormat,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub usage: ImageUsage,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewDesc {
    pub dimension: Dimension,
    pub format: HostFormat,
    pub components: [ComponentSwizzle; 4],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostFilter {
    Nearest,
    Linear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MipmapMode {
    Nearest,
    Linear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    MirrorClampToEdge,
    ClampToBorder,
}

impl From<ClampMode> for AddressMode {
    fn from(mode: ClampMode) -> Self {
        match mode {
            ClampMode::Repeat => Self::Repeat,
            ClampMode::MirroredRepeat => Self::MirroredRepeat,
            ClampMode::ClampToEdge | ClampMode::ClampToHalfway => Self::ClampToEdge,
            ClampMode::MirrorClampToEdge
            | ClampMode::MirrorClampToHalfway
            | ClampMode::MirrorClampToBorder => Self::MirrorClampToEdge,
            ClampMode::ClampToBorder => Self::ClampToBorder,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HostSamplerDesc {
    pub min_filter: HostFilter,
    pub mag_filter: HostFilter,
    pub mipmap_mode: MipmapMode,
    pub address_u: AddressMode,
    pub address_v: AddressMode,
    pub address_w: AddressMode,
    pub anisotropy_enable: bool,
    pub max_anisotropy: u32,
}

fn host_filter(stage: &'static str, filter: TextureFilter) -> Result<HostFilter, SamplerError> {
    match filter {
        TextureFilter::Point => Ok(HostFilter::Nearest),
        TextureFilter::Linear => Ok(HostFilter::Linear),
        TextureFilter::BaseMap | TextureFilter::UseFetchConst => {
            Err(SamplerError::Filter { stage, filter })
        }
    }
}

impl HostSamplerDesc {
    pub fn from_guest(desc: &SamplerDescription) -> Result<Self, SamplerError> {
        let mipmap_mode = match desc.mip_filter {
            TextureFilter::Point | TextureFilter::BaseMap => MipmapMode::Nearest,
            TextureFilter::Linear => MipmapMode::Linear,
            filter @ TextureFilter::UseFetchConst => {
                return Err(SamplerError::Filter { stage: "mip", filter })
            }
        };
        let max_anisotropy = match desc.aniso_filter {
            AnisoFilter::Disabled | AnisoFilter::Max1To1 => 1,
            AnisoFilter::Max2To1 => 2,
            AnisoFilter::Max4To1 => 4,
            AnisoFilter::Max8To1 => 8,
            AnisoFilter::Max16To1 => 16,
            other @ (AnisoFilter::Reserved | AnisoFilter::UseFetchConst) => {
                return Err(SamplerError::Aniso(other))
            }
        };

        Ok(Self {
            min_filter: host_filter("min", desc.min_filter)?,
            mag_filter: host_filter("mag", desc.mag_filter)?,
            mipmap_mode,
            address_u: desc.clamp_u.into(),
            address_v: desc.clamp_v.into(),
            address_w: desc.clamp_w.into(),
            anisotropy_enable: desc.aniso_filter != AnisoFilter::Disabled,
            max_anisotropy,
        })
    }
}

/// Buffer→image copy, in the shape of a Vulkan `VkBufferImageCopy`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferImageCopy {
    pub buffer_offset: u64,
    /// Row length of the buffer data in texels.
    pub buffer_row_length: u32,
    pub buffer_image_height: u32,
    pub image_width: u32,
    pub image_height: u32,
    /// Bytes of buffer data consumed by the copy.
    pub size: u64,
}

/// One combined image-sampler entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageBinding {
    pub view: ViewHandle,
    pub layout: ImageLayout,
    pub sampler: SamplerHandle,
}

/// A run of consecutive array elements of one binding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DescriptorWrite {
    pub binding: u32,
    pub first_array_element: u32,
    pub images: Vec<ImageBinding>,
}

/// Binding index of each texture dimensionality in the texture table layout.
pub fn binding_for_dimension(dimension: Dimension) -> u32 {
    match dimension {
        Dimension::D1 => 0,
        Dimension::D2 => 1,
        Dimension::D3 => 2,
        Dimension::Cube => 3,
    }
}

pub trait HostDevice {
    fn create_image(&mut self, desc: &ImageDesc) -> Result<ImageHandle, DeviceError>;
    fn destroy_image(&mut self, image: ImageHandle);

    fn create_view(&mut self, image: ImageHandle, desc: &ViewDesc) -> Result<ViewHandle, DeviceError>;
    fn destroy_view(&mut self, view: ViewHandle);

    fn create_sampler(&mut self, desc: &HostSamplerDesc) -> Result<SamplerHandle, DeviceError>;
    fn destroy_sampler(&mut self, sampler: SamplerHandle);

    fn create_staging_buffer(&mut self, size: u64) -> Result<BufferHandle, DeviceError>;
    /// Makes host writes to `[offset, offset + data.len())` visible to the device.
    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) -> Result<(), DeviceError>;
    fn destroy_buffer(&mut self, buffer: BufferHandle);

    fn cmd_image_barrier(
        &mut self,
        commands: CommandBufferHandle,
        image: ImageHandle,
        old_layout: ImageLayout,
        new_layout: ImageLayout,
    ) -> Result<(), DeviceError>;
    fn cmd_copy_buffer_to_image(
        &mut self,
        commands: CommandBufferHandle,
        buffer: BufferHandle,
        image: ImageHandle,
        region: &BufferImageCopy,
    ) -> Result<(), DeviceError>;

    fn allocate_binding_table(&mut self) -> Result<BindingTableHandle, DeviceError>;
    fn update_binding_table(
        &mut self,
        table: BindingTableHandle,
        writes: &[DescriptorWrite],
    ) -> Result<(), DeviceError>;
    fn free_binding_table(&mut self, table: BindingTableHandle);

    /// Non-blocking poll of a completion signal.
    fn signal_status(&self, signal: SignalId) -> SignalStatus;

    fn signal_fired(&self, signal: SignalId) -> bool {
        self.signal_status(signal) == SignalStatus::Fired
    }
}
