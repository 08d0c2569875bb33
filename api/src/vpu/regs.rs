//! 寄存器访问
//!
//! 设备寄存器窗口按字节偏移读写 32 位值。窗口由设备实例独占。

use core::ptr::{read_volatile, write_volatile};

use memory_addr::{PhysAddr, PhysAddrRange};

/// 寄存器读写接口
pub trait RegisterAccess {
    /// 读取寄存器
    fn read32(&self, offset: usize) -> u32;

    /// 写入寄存器
    fn write32(&self, offset: usize, value: u32);

    /// 读-改-写：先清除 `clear` 中的位，再置位 `set` 中的位
    fn modify32(&self, offset: usize, clear: u32, set: u32) {
        let value = self.read32(offset);
        self.write32(offset, (value & !clear) | set);
    }
}

/// 平台资源描述 (总线地址 + 大小)
#[derive(Debug, Clone, Copy)]
pub struct PlatformResource {
    /// 资源名称
    pub name: &'static str,
    /// 物理地址范围
    pub range: PhysAddrRange,
}

impl PlatformResource {
    pub fn new(name: &'static str, base: usize, size: usize) -> Self {
        Self {
            name,
            range: PhysAddrRange::from_start_size(PhysAddr::from(base), size),
        }
    }

    pub fn size(&self) -> usize {
        self.range.size()
    }
}

/// 内存映射的寄存器窗口
pub struct MmioRegs {
    base: *mut u8,
    resource: PlatformResource,
}

// SAFETY: 寄存器访问是通过内存映射进行的，可以安全地在线程间共享
// 寄存器访问本身是原子的，多线程访问需要在更高层进行同步
unsafe impl Sync for MmioRegs {}
unsafe impl Send for MmioRegs {}

impl MmioRegs {
    /// 创建寄存器窗口
    ///
    /// # Safety
    /// 调用者必须确保 `base` 指向 `resource` 映射后的有效寄存器地址，
    /// 且映射长度不小于 `resource.size()`
    pub const unsafe fn new(base: *mut u8, resource: PlatformResource) -> Self {
        Self { base, resource }
    }

    /// 获取基地址
    pub fn base(&self) -> *mut u8 {
        self.base
    }

    /// 获取平台资源
    pub fn resource(&self) -> &PlatformResource {
        &self.resource
    }

    #[inline]
    fn check(&self, offset: usize) {
        debug_assert!(
            offset % 4 == 0 && offset + 4 <= self.resource.size(),
            "register offset 0x{:x} outside {} window",
            offset,
            self.resource.name
        );
    }
}

impl RegisterAccess for MmioRegs {
    #[inline]
    fn read32(&self, offset: usize) -> u32 {
        self.check(offset);
        unsafe { read_volatile((self.base as usize + offset) as *const u32) }
    }

    #[inline]
    fn write32(&self, offset: usize, value: u32) {
        self.check(offset);
        #[cfg(feature = "trace-regs")]
        trace!("{}: write 0x{:08x} -> +0x{:03x}", self.resource.name, value, offset);
        unsafe { write_volatile((self.base as usize + offset) as *mut u32, value) }
    }
}
