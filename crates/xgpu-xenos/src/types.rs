//! Small closed enums decoded from fetch-constant bitfields.
//!
//! Every decoder here is total over its field width, so adding a guest
//! enumerant means adding a variant (and fixing every `match`), not a runtime
//! assert.

/// Fetch constant type tag (bits 0..2 of dword 0).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FetchConstantType {
    /// Slot not in use.
    Invalid,
    Reserved,
    Texture,
    Vertex,
}

impl FetchConstantType {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0x3 {
            0 => Self::Invalid,
            1 => Self::Reserved,
            2 => Self::Texture,
            _ => Self::Vertex,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dimension {
    D1,
    D2,
    D3,
    Cube,
}

impl Dimension {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0x3 {
            0 => Self::D1,
            1 => Self::D2,
            2 => Self::D3,
            _ => Self::Cube,
        }
    }

    pub fn to_bits(self) -> u32 {
        match self {
            Self::D1 => 0,
            Self::D2 => 1,
            Self::D3 => 2,
            Self::Cube => 3,
        }
    }
}

/// Guest byte order of texel data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Endian {
    #[default]
    None,
    /// Swap bytes within each 16-bit lane.
    Swap8In16,
    /// Swap bytes within each 32-bit lane.
    Swap8In32,
    /// Swap the 16-bit halves of each 32-bit lane.
    Swap16In32,
}

impl Endian {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0x3 {
            0 => Self::None,
            1 => Self::Swap8In16,
            2 => Self::Swap8In32,
            _ => Self::Swap16In32,
        }
    }

    pub fn to_bits(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Swap8In16 => 1,
            Self::Swap8In32 => 2,
            Self::Swap16In32 => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ClampMode {
    #[default]
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    MirrorClampToEdge,
    ClampToHalfway,
    MirrorClampToHalfway,
    ClampToBorder,
    MirrorClampToBorder,
}

impl ClampMode {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0x7 {
            0 => Self::Repeat,
            1 => Self::MirroredRepeat,
            2 => Self::ClampToEdge,
            3 => Self::MirrorClampToEdge,
            4 => Self::ClampToHalfway,
            5 => Self::MirrorClampToHalfway,
            6 => Self::ClampToBorder,
            _ => Self::MirrorClampToBorder,
        }
    }

    pub fn to_bits(self) -> u32 {
        match self {
            Self::Repeat => 0,
            Self::MirroredRepeat => 1,
            Self::ClampToEdge => 2,
            Self::MirrorClampToEdge => 3,
            Self::ClampToHalfway => 4,
            Self::MirrorClampToHalfway => 5,
            Self::ClampToBorder => 6,
            Self::MirrorClampToBorder => 7,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    #[default]
    Point,
    Linear,
    /// Mip filter only: sample the base level.
    BaseMap,
    /// Fetch instruction defers to the fetch constant.
    UseFetchConst,
}

impl TextureFilter {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0x3 {
            0 => Self::Point,
            1 => Self::Linear,
            2 => Self::BaseMap,
            _ => Self::UseFetchConst,
        }
    }

    pub fn to_bits(self) -> u32 {
        match self {
            Self::Point => 0,
            Self::Linear => 1,
            Self::BaseMap => 2,
            Self::UseFetchConst => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AnisoFilter {
    #[default]
    Disabled,
    Max1To1,
    Max2To1,
    Max4To1,
    Max8To1,
    Max16To1,
    /// Encoding 6 is not assigned by the hardware.
    Reserved,
    UseFetchConst,
}

impl AnisoFilter {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0x7 {
            0 => Self::Disabled,
            1 => Self::Max1To1,
            2 => Self::Max2To1,
            3 => Self::Max4To1,
            4 => Self::Max8To1,
            5 => Self::Max16To1,
            6 => Self::Reserved,
            _ => Self::UseFetchConst,
        }
    }

    pub fn to_bits(self) -> u32 {
        match self {
            Self::Disabled => 0,
            Self::Max1To1 => 1,
            Self::Max2To1 => 2,
            Self::Max4To1 => 3,
            Self::Max8To1 => 4,
            Self::Max16To1 => 5,
            Self::Reserved => 6,
            Self::UseFetchConst => 7,
        }
    }
}
