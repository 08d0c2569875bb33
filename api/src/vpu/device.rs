//! VPU 设备抽象
//!
//! 一个设备实例独占自己的寄存器窗口和 DMA 会话，硬件变体在 attach 时
//! 绑定一次，之后所有操作都经由该变体的操作表分发。

use alloc::sync::Arc;

use spin::Once;

use super::{
    error::{VpuError, VpuResult},
    hw::{HwDescriptor, HwOp, HwOps, HwOpsVariant, select_variant},
    regs::RegisterAccess,
};
use crate::dma::{DmaBufExporter, DmaSession};

/// VPU 设备状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VpuState {
    /// 未绑定硬件变体
    Uninitialized,
    /// 已绑定
    Bound,
}

/// VPU 设备
pub struct VpuDevice<R: RegisterAccess> {
    /// 寄存器窗口
    regs: R,
    /// 绑定的硬件变体，只写一次
    variant: Once<HwOpsVariant>,
    /// DMA buffer 导入会话
    session: DmaSession,
}

impl<R: RegisterAccess> VpuDevice<R> {
    /// 创建未绑定的设备
    pub fn new(regs: R, exporter: Arc<dyn DmaBufExporter>) -> Self {
        Self {
            regs,
            variant: Once::new(),
            session: DmaSession::new(exporter),
        }
    }

    /// 根据硬件描述绑定变体
    ///
    /// 已绑定的设备返回 `AlreadyBound`，没有匹配变体时返回 `NotSupported`。
    pub fn attach(&self, desc: HwDescriptor) -> VpuResult<HwOpsVariant> {
        if self.variant.is_completed() {
            return Err(VpuError::AlreadyBound);
        }

        let Some(variant) = select_variant(desc) else {
            warn!(
                "No VPU variant for generation={:?}, caps={:?}",
                desc.generation, desc.caps
            );
            return Err(VpuError::NotSupported);
        };

        // 并发 attach 时只有一个能写入
        let mut won = false;
        self.variant.call_once(|| {
            won = true;
            variant
        });
        if !won {
            return Err(VpuError::AlreadyBound);
        }

        info!("VPU bound to variant {:?}", variant);
        Ok(variant)
    }

    pub fn state(&self) -> VpuState {
        if self.variant.is_completed() {
            VpuState::Bound
        } else {
            VpuState::Uninitialized
        }
    }

    /// 已绑定的变体
    pub fn variant(&self) -> Option<HwOpsVariant> {
        self.variant.get().copied()
    }

    /// 已绑定变体的操作表
    pub fn ops(&self) -> VpuResult<&'static HwOps> {
        self.variant()
            .map(HwOpsVariant::ops)
            .ok_or(VpuError::NotSupported)
    }

    /// 探测硬件
    pub fn probe(&self) -> VpuResult<()> {
        let ops = self.ops()?;
        (ops.probe)(&self.regs)?;
        info!("VPU probed: {:?}", self.variant());
        Ok(())
    }

    /// 复位硬件
    pub fn reset(&self) -> VpuResult<()> {
        let ops = self.ops()?;
        self.dispatch("reset", ops.reset)
    }

    /// 移除前的硬件收尾
    pub fn remove(&self) -> VpuResult<()> {
        let ops = self.ops()?;
        self.dispatch("remove", ops.remove)?;
        info!("VPU removed: {:?}", self.variant());
        Ok(())
    }

    pub fn regs(&self) -> &R {
        &self.regs
    }

    /// 设备的 DMA 会话
    pub fn session(&self) -> &DmaSession {
        &self.session
    }

    fn dispatch(&self, name: &str, op: Option<HwOp>) -> VpuResult<()> {
        match op {
            Some(op) => op(&self.regs),
            None => {
                debug!("VPU variant {:?} has no {} op", self.variant(), name);
                Err(VpuError::NotSupported)
            }
        }
    }
}
