//! Guest texture formats and their block parameters.

/// Guest texture format (6-bit field in fetch dword 1).
///
/// Encodings 13, 21, 62 and 63 are unassigned and have no variant.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    K1Reverse,
    K1,
    K8,
    K1_5_5_5,
    K5_6_5,
    K6_5_5,
    K8_8_8_8,
    K2_10_10_10,
    K8A,
    K8B,
    K8_8,
    CrY1CbY0,
    Y1CrY0Cb,
    K8_8_8_8A,
    K4_4_4_4,
    K10_11_11,
    K11_11_10,
    Dxt1,
    Dxt2_3,
    Dxt4_5,
    K24_8,
    K24_8Float,
    K16,
    K16_16,
    K16_16_16_16,
    K16Expand,
    K16_16Expand,
    K16_16_16_16Expand,
    K16Float,
    K16_16Float,
    K16_16_16_16Float,
    K32,
    K32_32,
    K32_32_32_32,
    K32Float,
    K32_32Float,
    K32_32_32_32Float,
    K32As8,
    K32As8_8,
    K16Mpeg,
    K16_16Mpeg,
    K8Interlaced,
    K32As8Interlaced,
    K32As8_8Interlaced,
    K16Interlaced,
    K16MpegInterlaced,
    K16_16MpegInterlaced,
    Dxn,
    K8_8_8_8As16_16_16_16,
    Dxt1As16_16_16_16,
    Dxt2_3As16_16_16_16,
    Dxt4_5As16_16_16_16,
    K2_10_10_10As16_16_16_16,
    K10_11_11As16_16_16_16,
    K11_11_10As16_16_16_16,
    K32_32_32Float,
    Dxt3A,
    Dxt5A,
    Ctx1,
    Dxt3AAs1_1_1_1,
}

/// Block-compression parameters of a guest format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FormatInfo {
    pub block_width: u32,
    pub block_height: u32,
    pub bits_per_pixel: u32,
}

impl FormatInfo {
    const fn texel(bits_per_pixel: u32) -> Self {
        Self {
            block_width: 1,
            block_height: 1,
            bits_per_pixel,
        }
    }

    const fn block(block_width: u32, block_height: u32, bits_per_pixel: u32) -> Self {
        Self {
            block_width,
            block_height,
            bits_per_pixel,
        }
    }

    /// Bytes occupied by one block. Zero for the 1-bit formats.
    pub fn bytes_per_block(&self) -> u32 {
        self.block_width * self.block_height * self.bits_per_pixel / 8
    }

    pub fn is_compressed(&self) -> bool {
        self.block_width > 1 || self.block_height > 1
    }
}

impl TextureFormat {
    pub fn from_bits(bits: u32) -> Option<Self> {
        use TextureFormat::*;
        let format = match bits & 0x3f {
            0 => K1Reverse,
            1 => K1,
            2 => K8,
            3 => K1_5_5_5,
            4 => K5_6_5,
            5 => K6_5_5,
            6 => K8_8_8_8,
            7 => K2_10_10_10,
            8 => K8A,
            9 => K8B,
            10 => K8_8,
            11 => CrY1CbY0,
            12 => Y1CrY0Cb,
            14 => K8_8_8_8A,
            15 => K4_4_4_4,
            16 => K10_11_11,
            17 => K11_11_10,
            18 => Dxt1,
            19 => Dxt2_3,
            20 => Dxt4_5,
            22 => K24_8,
            23 => K24_8Float,
            24 => K16,
            25 => K16_16,
            26 => K16_16_16_16,
            27 => K16Expand,
            28 => K16_16Expand,
            29 => K16_16_16_16Expand,
            30 => K16Float,
            31 => K16_16Float,
            32 => K16_16_16_16Float,
            33 => K32,
            34 => K32_32,
            35 => K32_32_32_32,
            36 => K32Float,
            37 => K32_32Float,
            38 => K32_32_32_32Float,
            39 => K32As8,
            40 => K32As8_8,
            41 => K16Mpeg,
            42 => K16_16Mpeg,
            43 => K8Interlaced,
            44 => K32As8Interlaced,
            45 => K32As8_8Interlaced,
            46 => K16Interlaced,
            47 => K16MpegInterlaced,
            48 => K16_16MpegInterlaced,
            49 => Dxn,
            50 => K8_8_8_8As16_16_16_16,
            51 => Dxt1As16_16_16_16,
            52 => Dxt2_3As16_16_16_16,
            53 => Dxt4_5As16_16_16_16,
            54 => K2_10_10_10As16_16_16_16,
            55 => K10_11_11As16_16_16_16,
            56 => K11_11_10As16_16_16_16,
            57 => K32_32_32Float,
            58 => Dxt3A,
            59 => Dxt5A,
            60 => Ctx1,
            61 => Dxt3AAs1_1_1_1,
            _ => return None,
        };
        Some(format)
    }

    pub fn to_bits(self) -> u32 {
        use TextureFormat::*;
        match self {
            K1Reverse => 0,
            K1 => 1,
            K8 => 2,
            K1_5_5_5 => 3,
            K5_6_5 => 4,
            K6_5_5 => 5,
            K8_8_8_8 => 6,
            K2_10_10_10 => 7,
            K8A => 8,
            K8B => 9,
            K8_8 => 10,
            CrY1CbY0 => 11,
            Y1CrY0Cb => 12,
            K8_8_8_8A => 14,
            K4_4_4_4 => 15,
            K10_11_11 => 16,
            K11_11_10 => 17,
            Dxt1 => 18,
            Dxt2_3 => 19,
            Dxt4_5 => 20,
            K24_8 => 22,
            K24_8Float => 23,
            K16 => 24,
            K16_16 => 25,
            K16_16_16_16 => 26,
            K16Expand => 27,
            K16_16Expand => 28,
            K16_16_16_16Expand => 29,
            K16Float => 30,
            K16_16Float => 31,
            K16_16_16_16Float => 32,
            K32 => 33,
            K32_32 => 34,
            K32_32_32_32 => 35,
            K32Float => 36,
            K32_32Float => 37,
            K32_32_32_32Float => 38,
            K32As8 => 39,
            K32As8_8 => 40,
            K16Mpeg => 41,
            K16_16Mpeg => 42,
            K8Interlaced => 43,
            K32As8Interlaced => 44,
            K32As8_8Interlaced => 45,
            K16Interlaced => 46,
            K16MpegInterlaced => 47,
            K16_16MpegInterlaced => 48,
            Dxn => 49,
            K8_8_8_8As16_16_16_16 => 50,
            Dxt1As16_16_16_16 => 51,
            Dxt2_3As16_16_16_16 => 52,
            Dxt4_5As16_16_16_16 => 53,
            K2_10_10_10As16_16_16_16 => 54,
            K10_11_11As16_16_16_16 => 55,
            K11_11_10As16_16_16_16 => 56,
            K32_32_32Float => 57,
            Dxt3A => 58,
            Dxt5A => 59,
            Ctx1 => 60,
            Dxt3AAs1_1_1_1 => 61,
        }
    }

    pub fn info(self) -> FormatInfo {
        use TextureFormat::*;
        match self {
            K1Reverse | K1 => FormatInfo::texel(1),
            K8 | K8A | K8B | K8Interlaced => FormatInfo::texel(8),
            K1_5_5_5 | K5_6_5 | K6_5_5 | K8_8 | K4_4_4_4 => FormatInfo::texel(16),
            K16 | K16Expand | K16Float | K16Mpeg | K16Interlaced | K16MpegInterlaced => {
                FormatInfo::texel(16)
            }
            CrY1CbY0 | Y1CrY0Cb => FormatInfo::block(2, 1, 16),
            K8_8_8_8 | K2_10_10_10 | K8_8_8_8A | K10_11_11 | K11_11_10 => FormatInfo::texel(32),
            K24_8 | K24_8Float | K16_16 | K16_16Expand | K16_16Float | K16_16Mpeg => {
                FormatInfo::texel(32)
            }
            K16_16MpegInterlaced | K32 | K32Float => FormatInfo::texel(32),
            K8_8_8_8As16_16_16_16
            | K2_10_10_10As16_16_16_16
            | K10_11_11As16_16_16_16
            | K11_11_10As16_16_16_16 => FormatInfo::texel(32),
            K16_16_16_16 | K16_16_16_16Expand | K16_16_16_16Float | K32_32 | K32_32Float => {
                FormatInfo::texel(64)
            }
            K32_32_32Float => FormatInfo::texel(96),
            K32_32_32_32 | K32_32_32_32Float => FormatInfo::texel(128),
            K32As8 | K32As8Interlaced => FormatInfo::block(4, 1, 8),
            K32As8_8 | K32As8_8Interlaced => FormatInfo::block(2, 1, 16),
            Dxt1 | Dxt1As16_16_16_16 | Dxt3A | Dxt5A | Ctx1 | Dxt3AAs1_1_1_1 => {
                FormatInfo::block(4, 4, 4)
            }
            Dxt2_3 | Dxt4_5 | Dxn | Dxt2_3As16_16_16_16 | Dxt4_5As16_16_16_16 => {
                FormatInfo::block(4, 4, 8)
            }
        }
    }
}
