//! 已导入的 DMA buffer

use alloc::sync::Arc;
use core::{
    fmt,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

use super::types::{BufferHandle, DmaAddr, DmaBufObject, DmaDirection, DmaMapping, SessionId};

/// 已导入并映射到设备的缓冲区
pub struct ImportedBuffer {
    /// 外部句柄
    pub handle: BufferHandle,
    /// 所属会话
    pub session: SessionId,
    /// 外部缓冲区对象
    object: Arc<dyn DmaBufObject>,
    /// 设备映射
    mapping: DmaMapping,
    /// 引用计数，缓存列表本身持有一份
    ref_count: AtomicUsize,
    /// 是否已解除映射
    released: AtomicBool,
}

impl ImportedBuffer {
    pub(super) fn new(
        handle: BufferHandle,
        session: SessionId,
        object: Arc<dyn DmaBufObject>,
        mapping: DmaMapping,
    ) -> Self {
        Self {
            handle,
            session,
            object,
            mapping,
            // 一份属于缓存列表，一份返回给调用者
            ref_count: AtomicUsize::new(2),
            released: AtomicBool::new(false),
        }
    }

    /// 设备地址
    pub fn addr(&self) -> DmaAddr {
        self.mapping.addr
    }

    /// 设备映射
    pub fn mapping(&self) -> DmaMapping {
        self.mapping
    }

    pub fn ref_count(&self) -> usize {
        self.ref_count.load(Ordering::SeqCst)
    }

    /// 外部对象身份
    pub fn object_id(&self) -> u64 {
        self.object.id()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// 引用计数非零时加一
    ///
    /// 计数已经归零的条目正在被释放，不能再复用。
    pub(super) fn try_get(&self) -> bool {
        self.ref_count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                (count != 0).then(|| count + 1)
            })
            .is_ok()
    }

    /// 只剩缓存列表的引用 (或已归零) 时把计数置零，返回是否成功
    ///
    /// 成功后条目不能再被 [`try_get`](Self::try_get) 复用。
    pub(super) fn try_retire(&self) -> bool {
        self.ref_count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                (count <= 1).then_some(0)
            })
            .is_ok()
    }

    /// 引用计数减一，返回新的计数；计数已为零时返回 `None`
    pub(super) fn put(&self) -> Option<usize> {
        self.ref_count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                count.checked_sub(1)
            })
            .ok()
            .map(|old| old - 1)
    }

    /// 解除映射并断开连接，只会生效一次
    ///
    /// 外部对象在最后一个持有者释放本条目时关闭。
    pub(super) fn teardown(&self) {
        self.ref_count.store(0, Ordering::SeqCst);
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        self.object.unmap(&self.mapping, DmaDirection::Bidirectional);
        self.object.detach();
        debug!(
            "Unmapped DMA buffer: handle={}, iova=0x{:x}, size={}",
            self.handle.as_i32(),
            self.mapping.addr,
            self.mapping.size
        );
    }
}

impl fmt::Debug for ImportedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportedBuffer")
            .field("handle", &self.handle)
            .field("session", &self.session)
            .field("object", &self.object.id())
            .field("mapping", &self.mapping)
            .field("ref_count", &self.ref_count())
            .field("released", &self.is_released())
            .finish()
    }
}
