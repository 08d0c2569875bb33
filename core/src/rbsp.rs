//! RBSP 位写入器
//!
//! 在固定大小的字节缓冲区上按位追加数据。位序为大端：字节 0 的 bit 7
//! 最先写入。每次只修改目标位，同一字节中的其他位保持不变。

use crate::error::{RbspError, RbspResult};

/// 单次 [`BitWriter::write_bits`] 可写入的最大位数
pub const MAX_BITS_PER_WRITE: u32 = 32;

/// 位写入器
///
/// 绑定调用者持有的缓冲区，生命周期不超过该缓冲区的借用。
pub struct BitWriter<'a> {
    buf: &'a mut [u8],
    /// 当前位游标，范围 `0..=buf.len() * 8`
    pos: usize,
}

impl<'a> BitWriter<'a> {
    /// 在 `buf` 上创建写入器，从第 `start_bit` 位开始写
    ///
    /// 缓冲区为空，或起始偏移之后剩余不足一个字节时返回
    /// [`RbspError::OutOfRange`]。
    pub fn new(buf: &'a mut [u8], start_bit: usize) -> RbspResult<Self> {
        let capacity_bits = buf.len() * 8;
        if buf.is_empty() || capacity_bits.saturating_sub(start_bit) < 8 {
            return Err(RbspError::OutOfRange);
        }
        Ok(Self {
            buf,
            pos: start_bit,
        })
    }

    /// 缓冲区容量 (字节)
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// 缓冲区容量 (位)
    pub fn capacity_bits(&self) -> usize {
        self.buf.len() * 8
    }

    /// 当前位游标
    pub fn position(&self) -> usize {
        self.pos
    }

    /// 剩余可写位数
    pub fn remaining_bits(&self) -> usize {
        self.capacity_bits() - self.pos
    }

    /// 写入 `value` 的低 `count` 位，高位在前
    ///
    /// `count` 超过 32 返回 [`RbspError::OutOfRange`]；剩余空间不足时返回
    /// [`RbspError::BufferExhausted`]，此时不修改任何字节。
    pub fn write_bits(&mut self, count: u32, value: u32) -> RbspResult<()> {
        if count > MAX_BITS_PER_WRITE {
            return Err(RbspError::OutOfRange);
        }
        self.reserve(count as usize)?;

        for shift in (0..count).rev() {
            self.put_bit((value >> shift) & 1 != 0);
        }
        Ok(())
    }

    /// 写入单个标志位
    #[inline]
    pub fn write_flag(&mut self, value: bool) -> RbspResult<()> {
        self.write_bits(1, value as u32)
    }

    /// 连续写入 `count` 个 0 位 (占位/保留字段)
    pub fn write_zeros(&mut self, count: usize) -> RbspResult<()> {
        self.reserve(count)?;

        for _ in 0..count {
            self.put_bit(false);
        }
        Ok(())
    }

    /// 前进 `count` 位，不修改被跳过的位
    ///
    /// 剩余空间不足时返回 [`RbspError::BufferExhausted`]，游标不动。
    pub fn skip_bits(&mut self, count: usize) -> RbspResult<()> {
        self.reserve(count)?;
        self.pos += count;
        Ok(())
    }

    fn reserve(&self, count: usize) -> RbspResult<()> {
        if count > self.remaining_bits() {
            return Err(RbspError::BufferExhausted);
        }
        Ok(())
    }

    #[inline]
    fn put_bit(&mut self, bit: bool) {
        let mask = 0x80u8 >> (self.pos % 8);
        let byte = &mut self.buf[self.pos / 8];
        if bit {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
        self.pos += 1;
    }
}
