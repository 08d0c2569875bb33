//! DMA buffer 缓存错误类型定义

use core::fmt;

use axerrno::AxError;

/// 导入失败时所处的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStage {
    /// 打开外部缓冲区对象
    Open,
    /// 连接到设备
    Attach,
    /// 映射到设备地址空间
    Map,
    /// 句柄原先指向的缓冲区仍有调用者持有引用
    Evict,
}

/// DMA buffer 缓存错误类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaError {
    /// 外部缓冲区无法打开、连接或映射
    ImportError(ImportStage),
    /// 句柄未导入
    NotFound,
}

impl DmaError {
    /// 获取错误码 (兼容 Linux errno 风格)
    pub fn as_errno(&self) -> i32 {
        match self {
            DmaError::ImportError(ImportStage::Open) => -9, // EBADF
            DmaError::ImportError(ImportStage::Evict) => -16, // EBUSY
            DmaError::ImportError(_) => -12,                // ENOMEM
            DmaError::NotFound => -2,                       // ENOENT
        }
    }
}

impl fmt::Display for DmaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImportError(ImportStage::Open) => write!(f, "Failed to open external buffer"),
            Self::ImportError(ImportStage::Attach) => write!(f, "Failed to attach buffer"),
            Self::ImportError(ImportStage::Map) => write!(f, "Failed to map buffer"),
            Self::ImportError(ImportStage::Evict) => {
                write!(f, "Previous buffer behind handle still in use")
            }
            Self::NotFound => write!(f, "Buffer not found"),
        }
    }
}

impl From<DmaError> for AxError {
    fn from(err: DmaError) -> Self {
        match err {
            DmaError::ImportError(ImportStage::Open) => AxError::InvalidInput,
            DmaError::ImportError(ImportStage::Evict) => AxError::ResourceBusy,
            DmaError::ImportError(_) => AxError::NoMemory,
            DmaError::NotFound => AxError::NotFound,
        }
    }
}

pub type DmaResult<T> = Result<T, DmaError>;
