//! 量化矩阵重排
//!
//! 硬件按 zig-zag 扫描顺序读取量化矩阵，输入矩阵是光栅顺序。

use super::types::H264ScalingMatrix;
use crate::error::{RbspError, RbspResult};

/// 4x4 zig-zag 扫描表：第 `k` 个扫描位置对应的光栅下标
pub const ZIGZAG_4X4: [usize; 16] = [0, 1, 4, 8, 5, 2, 3, 6, 9, 12, 13, 10, 7, 11, 14, 15];

/// 8x8 zig-zag 扫描表 (帧扫描)
pub const ZIGZAG_8X8: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27,
    20, 13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58,
    59, 52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

const LISTS_4X4: usize = 6;
const LISTS_8X8: usize = 2;

/// 重排后量化表的字节数
pub const SCALING_LIST_SIZE: usize = LISTS_4X4 * 16 + LISTS_8X8 * 64;

/// 把量化矩阵按 zig-zag 顺序写入 `buf` 的前 [`SCALING_LIST_SIZE`] 字节
///
/// 先是 6 组 4x4，再是 2 组 8x8。`buf` 不足时返回
/// [`RbspError::BufferExhausted`] 且不写入任何内容。
pub fn update_scaling_list(buf: &mut [u8], matrix: &H264ScalingMatrix) -> RbspResult<()> {
    let out = buf
        .get_mut(..SCALING_LIST_SIZE)
        .ok_or(RbspError::BufferExhausted)?;
    let (out_4x4, out_8x8) = out.split_at_mut(LISTS_4X4 * 16);

    for (dst, list) in out_4x4.chunks_exact_mut(16).zip(&matrix.scaling_list_4x4) {
        reorder(dst, list, &ZIGZAG_4X4);
    }
    for (dst, list) in out_8x8.chunks_exact_mut(64).zip(&matrix.scaling_list_8x8) {
        reorder(dst, list, &ZIGZAG_8X8);
    }
    Ok(())
}

fn reorder(dst: &mut [u8], raster: &[u8], scan: &[usize]) {
    for (d, &pos) in dst.iter_mut().zip(scan) {
        *d = raster[pos];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_matrix() -> H264ScalingMatrix {
        let mut matrix = H264ScalingMatrix::flat();
        for (i, list) in matrix.scaling_list_4x4.iter_mut().enumerate() {
            for (j, v) in list.iter_mut().enumerate() {
                *v = (i * 16 + j) as u8;
            }
        }
        for (i, list) in matrix.scaling_list_8x8.iter_mut().enumerate() {
            for (j, v) in list.iter_mut().enumerate() {
                *v = (100 + i * 64 + j) as u8;
            }
        }
        matrix
    }

    fn is_permutation(table: &[usize]) -> bool {
        let mut seen = [false; 64];
        table.iter().all(|&i| !core::mem::replace(&mut seen[i], true))
    }

    #[test]
    fn test_tables_are_permutations() {
        assert!(is_permutation(&ZIGZAG_4X4));
        assert!(is_permutation(&ZIGZAG_8X8));
    }

    #[test]
    fn test_size() {
        assert_eq!(SCALING_LIST_SIZE, 224);
    }

    #[test]
    fn test_first_4x4_list() {
        let mut buf = [0u8; SCALING_LIST_SIZE];
        update_scaling_list(&mut buf, &sample_matrix()).unwrap();
        assert_eq!(
            &buf[..16],
            &[0, 1, 4, 8, 5, 2, 3, 6, 9, 12, 13, 10, 7, 11, 14, 15]
        );
        assert_eq!(buf[16], 16);
        assert_eq!(buf[96..100], [100, 101, 108, 116]);
    }

    #[test]
    fn test_inverse_recovers_raster() {
        let matrix = sample_matrix();
        let mut buf = [0u8; SCALING_LIST_SIZE];
        update_scaling_list(&mut buf, &matrix).unwrap();

        let mut restored = H264ScalingMatrix::flat();
        for (i, list) in restored.scaling_list_4x4.iter_mut().enumerate() {
            for (k, &pos) in ZIGZAG_4X4.iter().enumerate() {
                list[pos] = buf[i * 16 + k];
            }
        }
        for (i, list) in restored.scaling_list_8x8.iter_mut().enumerate() {
            for (k, &pos) in ZIGZAG_8X8.iter().enumerate() {
                list[pos] = buf[96 + i * 64 + k];
            }
        }
        assert_eq!(restored, matrix);
    }

    #[test]
    fn test_short_buffer() {
        let mut buf = [0xEEu8; SCALING_LIST_SIZE - 1];
        assert_eq!(
            update_scaling_list(&mut buf, &sample_matrix()),
            Err(RbspError::BufferExhausted)
        );
        assert!(buf.iter().all(|&b| b == 0xEE));
    }

    #[test]
    fn test_larger_buffer_untouched_tail() {
        let mut buf = [0xEEu8; SCALING_LIST_SIZE + 4];
        update_scaling_list(&mut buf, &H264ScalingMatrix::flat()).unwrap();
        assert!(buf[..SCALING_LIST_SIZE].iter().all(|&b| b == 16));
        assert_eq!(buf[SCALING_LIST_SIZE..], [0xEE; 4]);
    }
}
