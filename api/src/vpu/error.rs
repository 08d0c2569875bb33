//! VPU 错误类型定义

use core::fmt;

use axerrno::AxError;
use rkvpu_core::RbspError;

use crate::dma::{DmaAddr, DmaError};

/// VPU 操作错误类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VpuError {
    /// 设备未绑定硬件变体，或变体不支持该操作
    NotSupported,
    /// 设备已经绑定过硬件变体
    AlreadyBound,
    /// 硬件 ID 与变体不匹配
    IdMismatch { expected: u16, found: u16 },
    /// 设备地址超出寄存器可表示范围
    InvalidAddress(DmaAddr),
    /// 设备映射小于所需长度
    BufferTooSmall { required: usize, found: usize },
    /// 参数集编码失败
    Rbsp(RbspError),
    /// DMA buffer 导入/释放失败
    Dma(DmaError),
}

impl VpuError {
    /// 获取错误码 (兼容 Linux errno 风格)
    pub fn as_errno(&self) -> i32 {
        match self {
            VpuError::NotSupported => -95,       // EOPNOTSUPP
            VpuError::AlreadyBound => -16,       // EBUSY
            VpuError::IdMismatch { .. } => -19,  // ENODEV
            VpuError::InvalidAddress(_) => -14,  // EFAULT
            VpuError::BufferTooSmall { .. } => -22, // EINVAL
            VpuError::Rbsp(e) => e.as_errno(),
            VpuError::Dma(e) => e.as_errno(),
        }
    }
}

impl fmt::Display for VpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSupported => write!(f, "Operation not supported"),
            Self::AlreadyBound => write!(f, "Hardware variant already bound"),
            Self::IdMismatch { expected, found } => write!(
                f,
                "Hardware id mismatch: expected 0x{:04x}, found 0x{:04x}",
                expected, found
            ),
            Self::InvalidAddress(addr) => write!(f, "Device address 0x{:x} out of range", addr),
            Self::BufferTooSmall { required, found } => write!(
                f,
                "Buffer too small: need {} bytes, mapped {}",
                required, found
            ),
            Self::Rbsp(e) => write!(f, "Header encoding failed: {}", e),
            Self::Dma(e) => write!(f, "DMA buffer error: {}", e),
        }
    }
}

impl From<RbspError> for VpuError {
    fn from(err: RbspError) -> Self {
        Self::Rbsp(err)
    }
}

impl From<DmaError> for VpuError {
    fn from(err: DmaError) -> Self {
        Self::Dma(err)
    }
}

impl From<VpuError> for AxError {
    fn from(err: VpuError) -> Self {
        match err {
            VpuError::NotSupported => AxError::Unsupported,
            VpuError::AlreadyBound => AxError::AlreadyExists,
            VpuError::IdMismatch { .. } => AxError::NotFound,
            VpuError::InvalidAddress(_) | VpuError::BufferTooSmall { .. } => AxError::InvalidInput,
            VpuError::Rbsp(e) => e.into(),
            VpuError::Dma(e) => e.into(),
        }
    }
}

pub type VpuResult<T> = Result<T, VpuError>;
