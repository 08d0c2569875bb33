//! DMA buffer 导入缓存
//!
//! 每个编解码会话维护一张 "外部缓冲区句柄 → 已映射 DMA buffer" 的表。
//! 同一句柄重复导入时复用已有映射并增加引用计数，引用计数归零时才
//! 解除映射并断开连接。
//!
//! ## 并发模型
//!
//! - 查找不持有任何锁：读者克隆当前列表快照后在快照上遍历
//! - 插入和删除由会话内唯一的写者互斥锁串行化，以写时复制方式发布新快照
//! - 被移出列表的条目要等最后一个持有快照的读者结束后才真正释放
//! - 解除映射/断开连接只在引用计数归零 (或会话销毁) 时执行且只执行一次
//!
//! ## 使用示例
//!
//! ```ignore
//! let session = DmaSession::new(exporter);
//! let iova = session.import(BufferHandle(fd))?;
//! // ... 把 iova 写入硬件寄存器并启动 ...
//! session.release(BufferHandle(fd))?;
//! ```

mod buffer;
mod error;
mod session;
mod types;

pub use error::{DmaError, DmaResult, ImportStage};
pub use session::DmaSession;
pub use types::{
    BufferHandle, DmaAddr, DmaBufExporter, DmaBufObject, DmaDirection, DmaMapping, SessionId,
};
