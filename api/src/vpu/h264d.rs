//! H.264 解码启动流程
//!
//! 解码器从一块共享的 scratch buffer 中读取参数：
//!
//! ```text
//! +0    PPS 块   SPS | PPS | 尾部 (量化表地址、长期参考掩码)
//! +32   RPS 块   frame_num 表 + 两个参考列表
//! +128  量化表   6 个 4x4 + 2 个 8x8，zig-zag 顺序
//! ```
//!
//! [`H264Run::prepare`] 导入 scratch buffer 并持有一份引用，把参数写入
//! 调用者提供的 CPU 视图，再把各块的设备地址写入寄存器。
//! [`H264Run::trigger`] 启动硬件，[`H264Run::finish`] 归还引用。
//! 完成检测由调用者负责。

use rkvpu_core::{
    BitWriter, RbspError,
    h264::{
        H264DecodeParams, H264Pps, H264ScalingMatrix, H264SliceParams, H264Sps, PPS_BITS,
        PPS_TAIL_BITS, RPS_BITS, SCALING_LIST_SIZE, SPS_BITS, update_scaling_list,
        write_param_set, write_rps,
    },
};

use super::{
    device::VpuDevice,
    error::{VpuError, VpuResult},
    hw::H264RegLayout,
    regs::RegisterAccess,
};
use crate::dma::{BufferHandle, DmaAddr};

/// PPS 块偏移
pub const PPS_OFFSET: usize = 0;
/// PPS 块大小 (字节)
pub const PPS_REGION_SIZE: usize = 32;
/// RPS 块偏移
pub const RPS_OFFSET: usize = PPS_OFFSET + PPS_REGION_SIZE;
/// RPS 块大小 (字节)
pub const RPS_REGION_SIZE: usize = 96;
/// 量化表偏移
pub const SCALING_LIST_OFFSET: usize = RPS_OFFSET + RPS_REGION_SIZE;
/// scratch buffer 最小长度
pub const SCRATCH_SIZE: usize = SCALING_LIST_OFFSET + SCALING_LIST_SIZE;

const _: () = assert!(SPS_BITS + PPS_BITS + PPS_TAIL_BITS <= PPS_REGION_SIZE * 8);
const _: () = assert!(RPS_BITS <= RPS_REGION_SIZE * 8);
const _: () = assert!(SCRATCH_SIZE == 352);

/// 一帧解码所需的全部参数
#[derive(Debug, Clone, Copy)]
pub struct H264DecodeRequest<'a> {
    pub sps: &'a H264Sps,
    pub pps: &'a H264Pps,
    pub decode: &'a H264DecodeParams,
    pub slice: &'a H264SliceParams,
    pub scaling: &'a H264ScalingMatrix,
}

/// 已准备好的一次解码
#[must_use = "the scratch buffer reference is only returned by `finish`"]
#[derive(Debug)]
pub struct H264Run {
    scratch: BufferHandle,
    base: DmaAddr,
    layout: H264RegLayout,
}

impl H264Run {
    /// 导入 scratch buffer，写入参数并设置寄存器
    ///
    /// `cpu_view` 是同一 buffer 的 CPU 映射，长度至少为 [`SCRATCH_SIZE`]。
    /// 失败时已导入的引用会被归还，寄存器不被修改。
    pub fn prepare<R: RegisterAccess>(
        device: &VpuDevice<R>,
        scratch: BufferHandle,
        cpu_view: &mut [u8],
        request: &H264DecodeRequest<'_>,
    ) -> VpuResult<Self> {
        let layout = device.ops()?.h264.ok_or(VpuError::NotSupported)?;
        if cpu_view.len() < SCRATCH_SIZE {
            return Err(RbspError::BufferExhausted.into());
        }

        let mapping = device.session().import_mapping(scratch)?;
        let base = mapping.addr;
        let setup = Self::check_size(mapping.size)
            .and_then(|()| Self::region_addrs(base))
            .and_then(|addrs| {
                Self::encode(&mut cpu_view[..SCRATCH_SIZE], addrs.2, request)?;
                Ok(addrs)
            });
        let (pps_addr, rps_addr, _) = match setup {
            Ok(addrs) => addrs,
            Err(e) => {
                warn!("H.264 run setup failed: {}", e);
                if let Err(release_err) = device.session().release(scratch) {
                    warn!(
                        "Failed to release scratch fd={}: {}",
                        scratch.as_i32(),
                        release_err
                    );
                }
                return Err(e);
            }
        };

        let regs = device.regs();
        regs.write32(layout.pps_base, pps_addr);
        regs.write32(layout.rps_base, rps_addr);
        debug!(
            "H.264 run prepared: scratch fd={} at {:#x}",
            scratch.as_i32(),
            base
        );

        Ok(Self {
            scratch,
            base,
            layout,
        })
    }

    /// 置位启动位
    pub fn trigger<R: RegisterAccess>(&self, device: &VpuDevice<R>) {
        device
            .regs()
            .modify32(self.layout.ctrl, 0, self.layout.start);
    }

    /// 归还 scratch buffer 的引用
    pub fn finish<R: RegisterAccess>(self, device: &VpuDevice<R>) -> VpuResult<()> {
        device.session().release(self.scratch)?;
        Ok(())
    }

    /// scratch buffer 的设备地址
    pub fn base(&self) -> DmaAddr {
        self.base
    }

    pub fn scratch(&self) -> BufferHandle {
        self.scratch
    }

    /// 设备映射必须覆盖整个 scratch 布局
    fn check_size(size: usize) -> VpuResult<()> {
        if size < SCRATCH_SIZE {
            return Err(VpuError::BufferTooSmall {
                required: SCRATCH_SIZE,
                found: size,
            });
        }
        Ok(())
    }

    /// 各块的 32 位设备地址 (PPS, RPS, 量化表)
    fn region_addrs(base: DmaAddr) -> VpuResult<(u32, u32, u32)> {
        let addr = |offset: usize| -> VpuResult<u32> {
            let addr = base
                .checked_add(offset)
                .ok_or(VpuError::InvalidAddress(base))?;
            addr.as_u32().ok_or(VpuError::InvalidAddress(addr))
        };
        // 末尾也必须在 32 位范围内
        addr(SCRATCH_SIZE - 1)?;
        Ok((
            addr(PPS_OFFSET)?,
            addr(RPS_OFFSET)?,
            addr(SCALING_LIST_OFFSET)?,
        ))
    }

    fn encode(
        buf: &mut [u8],
        scaling_addr: u32,
        request: &H264DecodeRequest<'_>,
    ) -> VpuResult<()> {
        buf.fill(0);
        let (pps_region, rest) = buf.split_at_mut(RPS_OFFSET);
        let (rps_region, scaling_region) = rest.split_at_mut(RPS_REGION_SIZE);

        let mut w = BitWriter::new(pps_region, 0)?;
        write_param_set(
            &mut w,
            request.sps,
            request.pps,
            scaling_addr,
            request.decode,
        )?;

        let mut w = BitWriter::new(rps_region, 0)?;
        write_rps(&mut w, request.sps, request.slice, request.decode)?;

        update_scaling_list(scaling_region, request.scaling)?;
        Ok(())
    }
}
