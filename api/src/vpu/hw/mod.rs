//! 硬件操作表
//!
//! 每个 [`HwOpsVariant`] 对应一种 SoC 代际与编/解码器类别的组合，携带
//! 自己的寄存器编程序列。设备在 attach 时根据检测到的硬件描述选定变体，
//! 此后不再改变。

mod rk3288;
mod rk3399;

use bitflags::bitflags;

use super::{error::VpuResult, regs::RegisterAccess};

bitflags! {
    /// SoC 代际
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct VpuGeneration: u32 {
        const RK3288 = 1 << 0;
        const RK3399 = 1 << 1;
    }

    /// 编解码能力
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct VpuCaps: u32 {
        const H264_DEC = 1 << 0;
        const VP8_DEC = 1 << 1;
        const MPEG2_DEC = 1 << 2;
        const H264_ENC = 1 << 8;
        const VP8_ENC = 1 << 9;
        const JPEG_ENC = 1 << 10;

        const DECODER = Self::H264_DEC.bits() | Self::VP8_DEC.bits() | Self::MPEG2_DEC.bits();
        const ENCODER = Self::H264_ENC.bits() | Self::VP8_ENC.bits() | Self::JPEG_ENC.bits();
    }
}

/// 检测到的硬件描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HwDescriptor {
    /// 代际位，应只置一位
    pub generation: VpuGeneration,
    /// 需要的能力
    pub caps: VpuCaps,
}

impl HwDescriptor {
    pub const fn new(generation: VpuGeneration, caps: VpuCaps) -> Self {
        Self { generation, caps }
    }
}

/// 寄存器编程序列
pub type HwOp = fn(&dyn RegisterAccess) -> VpuResult<()>;

/// H.264 解码相关寄存器布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct H264RegLayout {
    /// PPS 块设备地址寄存器
    pub pps_base: usize,
    /// RPS 块设备地址寄存器
    pub rps_base: usize,
    /// 启动控制寄存器
    pub ctrl: usize,
    /// 启动位
    pub start: u32,
}

/// 一个变体的操作集合
pub struct HwOps {
    pub probe: HwOp,
    pub reset: Option<HwOp>,
    pub remove: Option<HwOp>,
    /// 支持 H.264 解码时的寄存器布局
    pub h264: Option<H264RegLayout>,
}

/// 硬件变体
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwOpsVariant {
    Rk3288Encoder,
    Rk3288Decoder,
    Rk3399Encoder,
    Rk3399Decoder,
}

struct HwOpsEntry {
    variant: HwOpsVariant,
    generations: VpuGeneration,
    caps: VpuCaps,
}

/// 变体表，按顺序匹配
static VARIANTS: [HwOpsEntry; 4] = [
    HwOpsEntry {
        variant: HwOpsVariant::Rk3288Encoder,
        generations: VpuGeneration::RK3288,
        caps: VpuCaps::ENCODER,
    },
    HwOpsEntry {
        variant: HwOpsVariant::Rk3288Decoder,
        generations: VpuGeneration::RK3288,
        caps: VpuCaps::DECODER,
    },
    HwOpsEntry {
        variant: HwOpsVariant::Rk3399Encoder,
        generations: VpuGeneration::RK3399,
        caps: VpuCaps::H264_ENC.union(VpuCaps::VP8_ENC).union(VpuCaps::JPEG_ENC),
    },
    HwOpsEntry {
        variant: HwOpsVariant::Rk3399Decoder,
        generations: VpuGeneration::RK3399,
        caps: VpuCaps::VP8_DEC.union(VpuCaps::MPEG2_DEC),
    },
];

/// 根据硬件描述选择变体
///
/// 代际位属于变体的代际掩码，且所需能力是变体能力的子集时匹配。
/// 描述中没有任何能力位时不匹配。
pub fn select_variant(desc: HwDescriptor) -> Option<HwOpsVariant> {
    if desc.caps.is_empty() || desc.generation.is_empty() {
        return None;
    }
    VARIANTS
        .iter()
        .find(|entry| entry.generations.contains(desc.generation) && entry.caps.contains(desc.caps))
        .map(|entry| entry.variant)
}

impl HwOpsVariant {
    /// 变体的操作集合
    pub fn ops(self) -> &'static HwOps {
        match self {
            HwOpsVariant::Rk3288Encoder => &rk3288::ENCODER_OPS,
            HwOpsVariant::Rk3288Decoder => &rk3288::DECODER_OPS,
            HwOpsVariant::Rk3399Encoder => &rk3399::ENCODER_OPS,
            HwOpsVariant::Rk3399Decoder => &rk3399::DECODER_OPS,
        }
    }

    /// 变体支持的能力
    pub fn caps(self) -> VpuCaps {
        VARIANTS
            .iter()
            .find(|entry| entry.variant == self)
            .map_or(VpuCaps::empty(), |entry| entry.caps)
    }

    pub fn is_decoder(self) -> bool {
        self.caps().intersects(VpuCaps::DECODER)
    }
}

/// 读取 Hantro 风格的 ID 寄存器并校验产品号 (高 16 位)
fn check_product_id(regs: &dyn RegisterAccess, offset: usize, expected: u16) -> VpuResult<()> {
    let found = (regs.read32(offset) >> 16) as u16;
    if found != expected {
        error!(
            "VPU id mismatch at +0x{:x}: expected 0x{:04x}, found 0x{:04x}",
            offset, expected, found
        );
        return Err(super::error::VpuError::IdMismatch { expected, found });
    }
    Ok(())
}
