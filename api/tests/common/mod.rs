#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use axerrno::{AxError, AxResult};
use hashbrown::HashMap;
use rkvpu_api::{
    dma::{BufferHandle, DmaAddr, DmaBufExporter, DmaBufObject, DmaDirection, DmaMapping},
    vpu::{RegisterAccess, VpuDevice},
};
use spin::Mutex;

/// 稀疏寄存器窗口，未写过的寄存器读出 `defaults` 中的值或 0
#[derive(Default)]
pub struct FakeRegs {
    values: Mutex<HashMap<usize, u32>>,
    writes: Mutex<Vec<(usize, u32)>>,
}

impl FakeRegs {
    pub fn with(defaults: &[(usize, u32)]) -> Self {
        let regs = Self::default();
        regs.values.lock().extend(defaults.iter().copied());
        regs
    }

    pub fn value(&self, offset: usize) -> u32 {
        self.values.lock().get(&offset).copied().unwrap_or(0)
    }

    pub fn writes(&self) -> Vec<(usize, u32)> {
        self.writes.lock().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().len()
    }
}

impl RegisterAccess for FakeRegs {
    fn read32(&self, offset: usize) -> u32 {
        self.value(offset)
    }

    fn write32(&self, offset: usize, value: u32) {
        self.values.lock().insert(offset, value);
        self.writes.lock().push((offset, value));
    }
}

#[derive(Default)]
pub struct Counters {
    pub map: AtomicUsize,
    pub unmap: AtomicUsize,
    pub detach: AtomicUsize,
}

impl Counters {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

struct FakeBuf {
    id: u64,
    addr: DmaAddr,
    size: usize,
    counters: Arc<Counters>,
}

impl DmaBufObject for FakeBuf {
    fn id(&self) -> u64 {
        self.id
    }

    fn attach(&self) -> AxResult<()> {
        Ok(())
    }

    fn map(&self, _dir: DmaDirection) -> AxResult<DmaMapping> {
        self.counters.map.fetch_add(1, Ordering::SeqCst);
        Ok(DmaMapping {
            addr: self.addr,
            size: self.size,
        })
    }

    fn unmap(&self, _mapping: &DmaMapping, _dir: DmaDirection) {
        self.counters.unmap.fetch_add(1, Ordering::SeqCst);
    }

    fn detach(&self) {
        self.counters.detach.fetch_add(1, Ordering::SeqCst);
    }
}

/// 按句柄返回固定地址的外部缓冲区
#[derive(Default)]
pub struct FakeExporter {
    buffers: Mutex<HashMap<i32, (DmaAddr, usize)>>,
    pub counters: Arc<Counters>,
}

impl FakeExporter {
    pub fn install(&self, fd: i32, addr: u64) {
        self.install_sized(fd, addr, 0x1000);
    }

    pub fn install_sized(&self, fd: i32, addr: u64, size: usize) {
        self.buffers.lock().insert(fd, (DmaAddr(addr), size));
    }
}

impl DmaBufExporter for FakeExporter {
    fn open(&self, handle: BufferHandle) -> AxResult<Arc<dyn DmaBufObject>> {
        let (addr, size) = *self.buffers.lock().get(&handle.0).ok_or(AxError::BadFileDescriptor)?;
        Ok(Arc::new(FakeBuf {
            id: handle.0 as u64,
            addr,
            size,
            counters: self.counters.clone(),
        }))
    }
}

pub fn device(regs: FakeRegs) -> (Arc<FakeExporter>, VpuDevice<FakeRegs>) {
    let exporter = Arc::new(FakeExporter::default());
    let dev = VpuDevice::new(regs, exporter.clone());
    (exporter, dev)
}

/// 从缓冲区 `pos` 处按 MSB 优先读出 `count` 位
pub fn read_bits(buf: &[u8], pos: usize, count: usize) -> u32 {
    (pos..pos + count).fold(0, |acc, bit| {
        (acc << 1) | u32::from((buf[bit / 8] >> (7 - bit % 8)) & 1)
    })
}
