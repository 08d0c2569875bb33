//! Rockchip VPU 驱动接口层
//!
//! - [`dma`]: 每会话的 DMA buffer 导入缓存
//! - [`vpu`]: 寄存器访问、硬件变体绑定和 H.264 解码启动

#![cfg_attr(not(test), no_std)]

extern crate alloc;
#[macro_use]
extern crate log;

pub mod dma;
pub mod vpu;
