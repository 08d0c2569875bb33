//! 码流写入错误类型定义

use core::fmt;

use axerrno::AxError;

/// 码流写入错误类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RbspError {
    /// 写入器初始化参数非法 (缓冲区为空或起始偏移过大)
    OutOfRange,
    /// 写入超出缓冲区容量
    BufferExhausted,
}

impl RbspError {
    /// 获取错误码 (兼容 Linux errno 风格)
    pub fn as_errno(&self) -> i32 {
        match self {
            RbspError::OutOfRange => -22,      // EINVAL
            RbspError::BufferExhausted => -28, // ENOSPC
        }
    }
}

impl fmt::Display for RbspError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange => write!(f, "Bit offset out of range"),
            Self::BufferExhausted => write!(f, "Bitstream buffer exhausted"),
        }
    }
}

impl From<RbspError> for AxError {
    fn from(err: RbspError) -> Self {
        match err {
            RbspError::OutOfRange => AxError::InvalidInput,
            RbspError::BufferExhausted => AxError::NoMemory,
        }
    }
}

pub type RbspResult<T> = Result<T, RbspError>;
