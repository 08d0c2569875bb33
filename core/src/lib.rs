//! Rockchip VPU 码流核心
//!
//! 提供 VPU 驱动在触发硬件前需要的纯数据格式处理：
//!
//! - [`rbsp`]: 大端、MSB 优先的位写入器
//! - [`h264`]: 按硬件期望的原始布局序列化 H.264 SPS/PPS/RPS 与量化矩阵
//!
//! 这里不做任何加锁和 I/O，所有输出都写入调用者提供的缓冲区。

#![cfg_attr(not(test), no_std)]

#[macro_use]
extern crate log;

pub mod error;
pub mod h264;
pub mod rbsp;

pub use error::{RbspError, RbspResult};
pub use rbsp::BitWriter;
