//! Rockchip VPU 驱动
//!
//! 码流格式处理来自 `rkvpu-core`，设备、寄存器与 DMA buffer 管理来自
//! `rkvpu-api`。

#![no_std]

pub use rkvpu_api::{dma, vpu};
pub use rkvpu_core::{BitWriter, RbspError, RbspResult, h264, rbsp};
