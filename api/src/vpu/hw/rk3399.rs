//! RK3399 VPU (VEPU2 编码器 / VDPU2 解码器)
//!
//! VPU2 没有 ID 寄存器，probe 只做初始化编程。

use super::HwOps;
use crate::vpu::{error::VpuResult, regs::RegisterAccess};

const VEPU2_REG_ENC_CTRL: usize = 0x19c;
const VEPU2_REG_INTERRUPT: usize = 0x1b4;
const VEPU2_REG_AXI_CTRL: usize = 0x1b8;

const VEPU2_INTERRUPT_DIS: u32 = 1 << 1;
const VEPU2_ENC_ENABLE: u32 = 1 << 0;
const VEPU2_AXI_DEFAULT: u32 = 16 << 24;

const VDPU2_REG_INTERRUPT: usize = 0x0dc;
const VDPU2_REG_CONFIG: usize = 0x0e4;

const VDPU2_CONFIG_DEFAULT: u32 = 16 | (1 << 12);

pub(super) static ENCODER_OPS: HwOps = HwOps {
    probe: encoder_probe,
    reset: Some(encoder_reset),
    remove: None,
    h264: None,
};

pub(super) static DECODER_OPS: HwOps = HwOps {
    probe: decoder_probe,
    reset: None,
    remove: None,
    h264: None,
};

fn encoder_probe(regs: &dyn RegisterAccess) -> VpuResult<()> {
    regs.write32(VEPU2_REG_ENC_CTRL, 0);
    regs.write32(VEPU2_REG_INTERRUPT, 0);
    regs.write32(VEPU2_REG_AXI_CTRL, VEPU2_AXI_DEFAULT);
    Ok(())
}

fn encoder_reset(regs: &dyn RegisterAccess) -> VpuResult<()> {
    regs.write32(VEPU2_REG_INTERRUPT, VEPU2_INTERRUPT_DIS);
    regs.modify32(VEPU2_REG_ENC_CTRL, VEPU2_ENC_ENABLE, 0);
    regs.write32(VEPU2_REG_INTERRUPT, 0);
    Ok(())
}

fn decoder_probe(regs: &dyn RegisterAccess) -> VpuResult<()> {
    regs.write32(VDPU2_REG_INTERRUPT, 0);
    regs.write32(VDPU2_REG_CONFIG, VDPU2_CONFIG_DEFAULT);
    Ok(())
}
