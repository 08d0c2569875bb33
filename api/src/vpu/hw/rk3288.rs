//! RK3288 VPU (H1 编码器 / G1 解码器)

use super::{H264RegLayout, HwOps, check_product_id};
use crate::vpu::{error::VpuResult, regs::RegisterAccess};

// ============ 编码器寄存器偏移 ============

/// ID 寄存器，高 16 位为产品号
const VEPU_REG_ID: usize = 0x000;
/// 中断寄存器
const VEPU_REG_INTERRUPT: usize = 0x004;
/// AXI 总线控制
const VEPU_REG_AXI_CTRL: usize = 0x008;
/// 编码控制
const VEPU_REG_ENC_CTRL: usize = 0x038;

const VEPU_PRODUCT_ID: u16 = 0x4831;

/// 中断禁止位
const VEPU_INTERRUPT_DIS: u32 = 1 << 1;
/// 中断挂起位
const VEPU_INTERRUPT_IRQ: u32 = 1 << 0;
/// 编码使能位
const VEPU_ENC_ENABLE: u32 = 1 << 0;
/// AXI 突发长度 16
const VEPU_AXI_BURST_16: u32 = 16 << 8;

// ============ 解码器寄存器偏移 ============

const VDPU_REG_ID: usize = 0x000;
/// 中断/启动寄存器
const VDPU_REG_INTERRUPT: usize = 0x004;
/// 解码配置
const VDPU_REG_CONFIG: usize = 0x008;
/// PPS 块地址
const VDPU_REG_PPS_BASE: usize = 0x0a0;
/// RPS 块地址
const VDPU_REG_RPS_BASE: usize = 0x0a4;

const VDPU_PRODUCT_ID: u16 = 0x6731;

/// 解码启动位
const VDPU_DEC_E: u32 = 1 << 0;
const VDPU_IRQ_DIS: u32 = 1 << 4;
const VDPU_IRQ: u32 = 1 << 8;
/// 输出/输入端序与突发长度的默认配置
const VDPU_CONFIG_DEFAULT: u32 = 16 | (1 << 10) | (1 << 11);

pub(super) static ENCODER_OPS: HwOps = HwOps {
    probe: encoder_probe,
    reset: Some(encoder_reset),
    remove: Some(encoder_remove),
    h264: None,
};

pub(super) static DECODER_OPS: HwOps = HwOps {
    probe: decoder_probe,
    reset: Some(decoder_reset),
    remove: Some(decoder_remove),
    h264: Some(H264RegLayout {
        pps_base: VDPU_REG_PPS_BASE,
        rps_base: VDPU_REG_RPS_BASE,
        ctrl: VDPU_REG_INTERRUPT,
        start: VDPU_DEC_E,
    }),
};

fn encoder_probe(regs: &dyn RegisterAccess) -> VpuResult<()> {
    check_product_id(regs, VEPU_REG_ID, VEPU_PRODUCT_ID)?;
    regs.write32(VEPU_REG_ENC_CTRL, 0);
    regs.write32(VEPU_REG_INTERRUPT, 0);
    regs.write32(VEPU_REG_AXI_CTRL, VEPU_AXI_BURST_16);
    Ok(())
}

fn encoder_reset(regs: &dyn RegisterAccess) -> VpuResult<()> {
    regs.write32(VEPU_REG_INTERRUPT, VEPU_INTERRUPT_DIS);
    regs.modify32(VEPU_REG_ENC_CTRL, VEPU_ENC_ENABLE, 0);
    regs.write32(VEPU_REG_AXI_CTRL, VEPU_AXI_BURST_16);
    // 清除残留中断
    regs.modify32(VEPU_REG_INTERRUPT, VEPU_INTERRUPT_IRQ | VEPU_INTERRUPT_DIS, 0);
    Ok(())
}

fn encoder_remove(regs: &dyn RegisterAccess) -> VpuResult<()> {
    regs.write32(VEPU_REG_ENC_CTRL, 0);
    regs.write32(VEPU_REG_INTERRUPT, VEPU_INTERRUPT_DIS);
    Ok(())
}

fn decoder_probe(regs: &dyn RegisterAccess) -> VpuResult<()> {
    check_product_id(regs, VDPU_REG_ID, VDPU_PRODUCT_ID)?;
    regs.write32(VDPU_REG_INTERRUPT, 0);
    regs.write32(VDPU_REG_CONFIG, VDPU_CONFIG_DEFAULT);
    Ok(())
}

fn decoder_reset(regs: &dyn RegisterAccess) -> VpuResult<()> {
    regs.write32(VDPU_REG_INTERRUPT, VDPU_IRQ_DIS);
    regs.write32(VDPU_REG_CONFIG, VDPU_CONFIG_DEFAULT);
    regs.modify32(VDPU_REG_INTERRUPT, VDPU_IRQ | VDPU_IRQ_DIS | VDPU_DEC_E, 0);
    Ok(())
}

fn decoder_remove(regs: &dyn RegisterAccess) -> VpuResult<()> {
    regs.write32(VDPU_REG_INTERRUPT, VDPU_IRQ_DIS);
    regs.write32(VDPU_REG_CONFIG, 0);
    Ok(())
}
