//! Rockchip VPU 驱动
//!
//! 寄存器访问、硬件变体表、设备实例以及 H.264 解码启动流程。

pub mod device;
pub mod error;
pub mod h264d;
pub mod hw;
pub mod regs;

pub use device::{VpuDevice, VpuState};
pub use error::{VpuError, VpuResult};
pub use h264d::{H264DecodeRequest, H264Run, SCRATCH_SIZE};
pub use hw::{
    H264RegLayout, HwDescriptor, HwOp, HwOps, HwOpsVariant, VpuCaps, VpuGeneration,
    select_variant,
};
pub use regs::{MmioRegs, PlatformResource, RegisterAccess};

/// RK3288 VPU 寄存器窗口物理基地址
pub const RK3288_VPU_PHYS_BASE: usize = 0xff9a_0000;
/// RK3399 VPU 寄存器窗口物理基地址
pub const RK3399_VPU_PHYS_BASE: usize = 0xff65_0000;
/// 编码器/解码器寄存器窗口大小
pub const VPU_WINDOW_SIZE: usize = 0x400;
