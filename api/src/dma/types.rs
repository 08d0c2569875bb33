//! DMA buffer 缓存数据结构定义

use alloc::sync::Arc;
use core::{
    fmt,
    sync::atomic::{AtomicU32, Ordering},
};

use axerrno::AxResult;

/// 外部缓冲区句柄 (文件描述符号)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct BufferHandle(pub i32);

impl BufferHandle {
    pub fn as_i32(self) -> i32 {
        self.0
    }
}

/// 设备可见地址 (IOVA)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct DmaAddr(pub u64);

impl DmaAddr {
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// 32 位寄存器可表示时返回低 32 位
    pub fn as_u32(self) -> Option<u32> {
        u32::try_from(self.0).ok()
    }

    /// 加上偏移，溢出时返回 `None`
    pub const fn checked_add(self, offset: usize) -> Option<Self> {
        match self.0.checked_add(offset as u64) {
            Some(addr) => Some(Self(addr)),
            None => None,
        }
    }
}

impl fmt::LowerHex for DmaAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// 会话 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct SessionId(pub u32);

impl SessionId {
    pub fn new() -> Self {
        static COUNTER: AtomicU32 = AtomicU32::new(1);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

/// DMA 传输方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaDirection {
    Bidirectional,
    ToDevice,
    FromDevice,
}

/// 一次设备映射的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaMapping {
    /// 设备地址
    pub addr: DmaAddr,
    /// 映射长度
    pub size: usize,
}

/// 外部缓冲区对象 (对应 dma-buf)
///
/// 对象本身的关闭由最后一个 `Arc` 的释放完成。
pub trait DmaBufObject: Send + Sync {
    /// 对象身份；同一句柄被关闭后重新打开到另一个对象时 id 不同
    fn id(&self) -> u64;

    /// 连接到设备
    fn attach(&self) -> AxResult<()>;

    /// 映射到设备地址空间
    fn map(&self, dir: DmaDirection) -> AxResult<DmaMapping>;

    /// 解除映射
    fn unmap(&self, mapping: &DmaMapping, dir: DmaDirection);

    /// 断开与设备的连接
    fn detach(&self);
}

/// 外部缓冲区提供者：把句柄解析为缓冲区对象
pub trait DmaBufExporter: Send + Sync {
    fn open(&self, handle: BufferHandle) -> AxResult<Arc<dyn DmaBufObject>>;
}
