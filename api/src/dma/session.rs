//! DMA buffer 导入会话

use alloc::{sync::Arc, vec::Vec};

use spin::{Mutex, RwLock};

use super::{
    buffer::ImportedBuffer,
    error::{DmaError, DmaResult, ImportStage},
    types::{BufferHandle, DmaAddr, DmaBufExporter, DmaBufObject, DmaDirection, DmaMapping, SessionId},
};

type BufferList = Vec<Arc<ImportedBuffer>>;

/// DMA buffer 导入会话
///
/// 读者只在克隆快照指针时短暂持有 `buffers` 的读锁，遍历在快照上进行；
/// 结构性修改由 `writer` 串行化，并发布新的快照。
pub struct DmaSession {
    id: SessionId,
    /// 外部缓冲区提供者
    exporter: Arc<dyn DmaBufExporter>,
    /// 当前发布的缓冲区列表
    buffers: RwLock<Arc<BufferList>>,
    /// 写者锁
    writer: Mutex<()>,
}

impl DmaSession {
    /// 创建绑定到 `exporter` 的空会话
    pub fn new(exporter: Arc<dyn DmaBufExporter>) -> Self {
        let id = SessionId::new();
        debug!("Created DMA session {}", id.0);
        Self {
            id,
            exporter,
            buffers: RwLock::new(Arc::new(Vec::new())),
            writer: Mutex::new(()),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// 导入句柄对应的缓冲区，返回设备地址
    ///
    /// 句柄已导入且仍指向同一个外部对象时只增加引用计数；否则打开、连接
    /// 并映射外部对象，新条目引用计数为 2 (缓存一份，调用者一份)。
    ///
    /// 句柄改指向新对象而旧条目仍有调用者引用时返回
    /// `ImportError(Evict)`：释放只按句柄查找，旧引用不能落到新条目上。
    pub fn import(&self, handle: BufferHandle) -> DmaResult<DmaAddr> {
        self.import_mapping(handle).map(|mapping| mapping.addr)
    }

    /// 同 [`import`](Self::import)，返回完整的设备映射
    pub fn import_mapping(&self, handle: BufferHandle) -> DmaResult<DmaMapping> {
        let object = self.exporter.open(handle).map_err(|e| {
            warn!("Failed to open DMA buffer fd={}: {:?}", handle.as_i32(), e);
            DmaError::ImportError(ImportStage::Open)
        })?;

        if let Some(mapping) = self.try_reuse(handle, &object) {
            return Ok(mapping);
        }

        let _guard = self.writer.lock();

        // 并发导入者可能已经插入了同一句柄
        if let Some(mapping) = self.try_reuse(handle, &object) {
            return Ok(mapping);
        }

        if let Some(stale) = self.find(handle) {
            if !stale.try_retire() {
                warn!(
                    "DMA buffer fd={} changed object while ref_count={}",
                    handle.as_i32(),
                    stale.ref_count()
                );
                return Err(DmaError::ImportError(ImportStage::Evict));
            }
            self.unpublish(&stale);
            stale.teardown();
        }

        let mapping = Self::attach_and_map(handle, object.as_ref())?;
        let buffer = Arc::new(ImportedBuffer::new(handle, self.id, object, mapping));
        self.publish(|list| list.push(buffer));

        debug!(
            "Imported DMA buffer: session={}, fd={}, iova=0x{:x}, size={}",
            self.id.0,
            handle.as_i32(),
            mapping.addr,
            mapping.size
        );
        Ok(mapping)
    }

    /// 释放一次引用，计数归零时解除映射并移出缓存
    pub fn release(&self, handle: BufferHandle) -> DmaResult<()> {
        let buffer = self.find(handle).ok_or(DmaError::NotFound)?;
        let remaining = buffer.put().ok_or(DmaError::NotFound)?;
        debug!(
            "Released DMA buffer fd={}, ref_count={}",
            handle.as_i32(),
            remaining
        );

        if remaining == 0 {
            {
                let _guard = self.writer.lock();
                self.unpublish(&buffer);
            }
            buffer.teardown();
        }
        Ok(())
    }

    /// 查询句柄当前的设备地址，不改变引用计数
    pub fn lookup(&self, handle: BufferHandle) -> Option<DmaAddr> {
        self.find(handle)
            .filter(|buffer| buffer.ref_count() > 0)
            .map(|buffer| buffer.addr())
    }

    /// 获取缓冲区数量
    pub fn buffer_count(&self) -> usize {
        self.snapshot().len()
    }

    /// 无视引用计数，释放会话中的所有缓冲区
    pub fn destroy(&self) {
        let buffers = {
            let _guard = self.writer.lock();
            core::mem::replace(&mut *self.buffers.write(), Arc::new(Vec::new()))
        };

        for buffer in buffers.iter() {
            buffer.teardown();
        }
        if !buffers.is_empty() {
            warn!(
                "Destroyed DMA session {} with {} buffers",
                self.id.0,
                buffers.len()
            );
        }
    }

    /// 获取所有句柄列表（用于调试）
    #[cfg(debug_assertions)]
    pub fn debug_list_handles(&self) -> Vec<BufferHandle> {
        self.snapshot().iter().map(|buffer| buffer.handle).collect()
    }

    fn snapshot(&self) -> Arc<BufferList> {
        self.buffers.read().clone()
    }

    fn find(&self, handle: BufferHandle) -> Option<Arc<ImportedBuffer>> {
        self.snapshot()
            .iter()
            .find(|buffer| buffer.handle == handle)
            .cloned()
    }

    fn try_reuse(
        &self,
        handle: BufferHandle,
        object: &Arc<dyn DmaBufObject>,
    ) -> Option<DmaMapping> {
        let buffer = self.find(handle)?;
        if buffer.object_id() != object.id() || !buffer.try_get() {
            return None;
        }
        debug!(
            "Reusing DMA buffer fd={}, ref_count={}",
            handle.as_i32(),
            buffer.ref_count()
        );
        Some(buffer.mapping())
    }

    /// 调用者必须持有写者锁
    fn publish(&self, update: impl FnOnce(&mut BufferList)) {
        let mut next = BufferList::clone(&self.snapshot());
        update(&mut next);
        *self.buffers.write() = Arc::new(next);
    }

    /// 调用者必须持有写者锁
    fn unpublish(&self, buffer: &Arc<ImportedBuffer>) {
        self.publish(|list| list.retain(|b| !Arc::ptr_eq(b, buffer)));
    }

    fn attach_and_map(handle: BufferHandle, object: &dyn DmaBufObject) -> DmaResult<DmaMapping> {
        object.attach().map_err(|e| {
            warn!("Failed to attach DMA buffer fd={}: {:?}", handle.as_i32(), e);
            DmaError::ImportError(ImportStage::Attach)
        })?;

        object.map(DmaDirection::Bidirectional).map_err(|e| {
            warn!("Failed to map DMA buffer fd={}: {:?}", handle.as_i32(), e);
            object.detach();
            DmaError::ImportError(ImportStage::Map)
        })
    }
}

impl Drop for DmaSession {
    fn drop(&mut self) {
        self.destroy();
    }
}
