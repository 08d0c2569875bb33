//! SPS / PPS / RPS 原始布局编码

use super::types::{
    CONSTRAINT_SET3_FLAG, DPB_SIZE, H264DecodeParams, H264Pps, H264SliceParams, H264Sps,
    PpsFlags, REF_LIST_SIZE, SliceType, SpsFlags,
};
use crate::{error::RbspResult, rbsp::BitWriter};

/// SPS 块位数
pub const SPS_BITS: usize = 101;
/// PPS 块位数
pub const PPS_BITS: usize = 50;
/// PPS 尾部 (量化表地址、长期参考掩码) 位数
pub const PPS_TAIL_BITS: usize = 72;
/// 单个参考列表条目位数
pub const RPS_ENTRY_BITS: usize = 7;
/// RPS 块位数：16 个 frame_num、保留字段和两个参考列表
pub const RPS_BITS: usize = DPB_SIZE * 16 + 32 + 2 * REF_LIST_SIZE * RPS_ENTRY_BITS;

/// 多视点 (MVC) 占位字段位数，单视点时全部为 0
const SPS_MVC_PLACEHOLDER_BITS: usize = 45;
const SPS_PAD_BITS: usize = 3;

/// PPS id 占位值，硬件不使用
const PPS_ID_PLACEHOLDER: u32 = 0xff;

/// 参考列表条目中的有效位 (5 位字段的 bit 4)
const RPS_ENTRY_VALID: u32 = 1 << 4;

/// 写入 SPS 块
pub fn write_sps(w: &mut BitWriter<'_>, sps: &H264Sps) -> RbspResult<()> {
    w.write_bits(8, u32::from(sps.profile_idc))?;
    w.write_flag(sps.constraint_set_flags & CONSTRAINT_SET3_FLAG != 0)?;
    w.write_bits(2, u32::from(sps.chroma_format_idc))?;
    w.write_bits(3, u32::from(sps.bit_depth_luma_minus8))?;
    w.write_bits(3, u32::from(sps.bit_depth_chroma_minus8))?;
    w.write_bits(4, u32::from(sps.log2_max_frame_num_minus4))?;
    w.write_bits(4, u32::from(sps.max_num_ref_frames))?;
    w.write_bits(2, u32::from(sps.pic_order_cnt_type))?;
    w.write_bits(4, u32::from(sps.log2_max_pic_order_cnt_lsb_minus4))?;
    w.write_flag(sps.flags.contains(SpsFlags::DELTA_PIC_ORDER_ALWAYS_ZERO))?;
    w.write_bits(9, u32::from(sps.pic_width_in_mbs_minus1) + 1)?;
    w.write_bits(9, u32::from(sps.pic_height_in_map_units_minus1) + 1)?;
    w.write_flag(sps.flags.contains(SpsFlags::FRAME_MBS_ONLY))?;
    w.write_flag(sps.flags.contains(SpsFlags::MB_ADAPTIVE_FRAME_FIELD))?;
    w.write_flag(sps.flags.contains(SpsFlags::DIRECT_8X8_INFERENCE))?;

    w.write_zeros(SPS_MVC_PLACEHOLDER_BITS)?;
    w.write_zeros(SPS_PAD_BITS)
}

/// 写入 PPS 块
///
/// 有符号字段取补码后截断到字段宽度。
pub fn write_pps(w: &mut BitWriter<'_>, pps: &H264Pps) -> RbspResult<()> {
    let flags = pps.flags;

    w.write_bits(8, PPS_ID_PLACEHOLDER)?;
    w.write_flag(flags.contains(PpsFlags::ENTROPY_CODING_MODE))?;
    w.write_flag(flags.contains(PpsFlags::BOTTOM_FIELD_PIC_ORDER_IN_FRAME_PRESENT))?;
    w.write_bits(5, u32::from(pps.num_ref_idx_l0_default_active_minus1))?;
    w.write_bits(5, u32::from(pps.num_ref_idx_l1_default_active_minus1))?;
    w.write_flag(flags.contains(PpsFlags::WEIGHTED_PRED))?;
    w.write_bits(2, u32::from(pps.weighted_bipred_idc))?;
    w.write_bits(7, raw(pps.pic_init_qp_minus26))?;
    w.write_bits(6, raw(pps.pic_init_qs_minus26))?;
    w.write_bits(5, raw(pps.chroma_qp_index_offset))?;
    w.write_flag(flags.contains(PpsFlags::DEBLOCKING_FILTER_CONTROL_PRESENT))?;
    w.write_flag(flags.contains(PpsFlags::CONSTRAINED_INTRA_PRED))?;
    w.write_flag(flags.contains(PpsFlags::TRANSFORM_8X8_MODE))?;
    w.write_bits(5, raw(pps.second_chroma_qp_index_offset))?;
    w.write_flag(flags.contains(PpsFlags::SCALING_MATRIX_PRESENT))
}

/// 写入 PPS 尾部：量化表地址、长期参考掩码、保留字段和填充
pub fn write_pps_tail(
    w: &mut BitWriter<'_>,
    scaling_list_addr: u32,
    decode: &H264DecodeParams,
) -> RbspResult<()> {
    w.write_bits(32, scaling_list_addr)?;
    w.write_bits(16, u32::from(decode.long_term_mask()))?;
    w.write_zeros(16)?;
    w.write_zeros(8)
}

/// 依次写入 SPS、PPS 和 PPS 尾部
pub fn write_param_set(
    w: &mut BitWriter<'_>,
    sps: &H264Sps,
    pps: &H264Pps,
    scaling_list_addr: u32,
    decode: &H264DecodeParams,
) -> RbspResult<()> {
    write_sps(w, sps)?;
    write_pps(w, pps)?;
    write_pps_tail(w, scaling_list_addr, decode)
}

/// 写入参考图像集
///
/// 先写 16 个 frame_num (超出取模基数的按基数回绕)，再写 32 位保留字段，
/// 最后是两个参考列表块。条带用不到的列表写成全 0，总长度固定为
/// [`RPS_BITS`]。
pub fn write_rps(
    w: &mut BitWriter<'_>,
    sps: &H264Sps,
    slice: &H264SliceParams,
    decode: &H264DecodeParams,
) -> RbspResult<()> {
    let max_frame_num = sps.max_frame_num();

    for entry in decode.dpb.iter() {
        let frame_num = if entry.is_active() {
            wrap_frame_num(u32::from(entry.frame_num), max_frame_num)
        } else {
            0
        };
        w.write_bits(16, frame_num)?;
    }
    w.write_zeros(32)?;

    let lists = [&slice.ref_pic_list0, &slice.ref_pic_list1];
    let used = slice.slice_type.ref_list_count();
    trace!(
        "RPS: slice_type={:?}, {} reference list(s)",
        slice.slice_type, used
    );

    for (i, list) in lists.into_iter().enumerate() {
        if i < used {
            fill_rps_list(w, list, decode)?;
        } else {
            w.write_zeros(REF_LIST_SIZE * RPS_ENTRY_BITS)?;
        }
    }
    Ok(())
}

/// 写入一个 32 项参考列表块
///
/// 指向空闲槽位 (或越界下标) 的条目写 7 个 0 位；否则写 5 位的
/// `槽位下标 | 有效位`，再跟两个占位标志位。
pub fn fill_rps_list(
    w: &mut BitWriter<'_>,
    list: &[u8; REF_LIST_SIZE],
    decode: &H264DecodeParams,
) -> RbspResult<()> {
    for &idx in list.iter() {
        let active = decode
            .dpb
            .get(usize::from(idx))
            .is_some_and(|entry| entry.is_active());

        if active {
            w.write_bits(5, u32::from(idx) | RPS_ENTRY_VALID)?;
            // 底场标志、长期参考标志占位
            w.write_flag(false)?;
            w.write_flag(false)?;
        } else {
            w.write_zeros(RPS_ENTRY_BITS)?;
        }
    }
    Ok(())
}

fn wrap_frame_num(frame_num: u32, max_frame_num: Option<u32>) -> u32 {
    match max_frame_num {
        Some(max) if frame_num >= max => frame_num % max,
        _ => frame_num,
    }
}

#[inline]
fn raw(value: i8) -> u32 {
    u32::from(value as u8)
}

// 块大小是硬件布局的一部分
const _: () = assert!(RPS_BITS == 736);
const _: () = assert!(SPS_BITS + PPS_BITS + PPS_TAIL_BITS <= 256);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::h264::types::DpbEntry;

    /// 从缓冲区 `pos` 处按 MSB 优先读出 `count` 位
    fn read_bits(buf: &[u8], pos: usize, count: usize) -> u32 {
        (pos..pos + count).fold(0, |acc, bit| {
            (acc << 1) | u32::from((buf[bit / 8] >> (7 - bit % 8)) & 1)
        })
    }

    fn qvga_sps() -> H264Sps {
        H264Sps {
            profile_idc: 100,
            chroma_format_idc: 1,
            bit_depth_luma_minus8: 0,
            pic_width_in_mbs_minus1: 19,
            pic_height_in_map_units_minus1: 14,
            flags: SpsFlags::FRAME_MBS_ONLY,
            ..Default::default()
        }
    }

    #[test]
    fn test_sps_exact_bytes() {
        let mut buf = [0u8; 16];
        let mut w = BitWriter::new(&mut buf, 0).unwrap();
        write_sps(&mut w, &qvga_sps()).unwrap();
        assert_eq!(w.position(), SPS_BITS);
        assert_eq!(
            buf,
            [
                0x64, 0x20, 0x00, 0x00, 0x0A, 0x03, 0xE0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
                0x00, 0x00, 0x00,
            ]
        );
    }

    #[test]
    fn test_sps_clears_stale_bytes() {
        let mut buf = [0xFFu8; 13];
        let mut w = BitWriter::new(&mut buf, 0).unwrap();
        write_sps(&mut w, &qvga_sps()).unwrap();
        assert_eq!(&buf[..7], &[0x64, 0x20, 0x00, 0x00, 0x0A, 0x03, 0xE0]);
        assert_eq!(&buf[7..12], &[0; 5]);
        // 最后 3 位不属于 SPS 块
        assert_eq!(buf[12], 0b0000_0111);
    }

    #[test]
    fn test_sps_needs_full_block() {
        let mut buf = [0u8; 12];
        let mut w = BitWriter::new(&mut buf, 0).unwrap();
        assert!(write_sps(&mut w, &qvga_sps()).is_err());
    }

    #[test]
    fn test_pps_fields() {
        let pps = H264Pps {
            num_ref_idx_l0_default_active_minus1: 3,
            num_ref_idx_l1_default_active_minus1: 1,
            weighted_bipred_idc: 2,
            pic_init_qp_minus26: -26,
            pic_init_qs_minus26: 5,
            chroma_qp_index_offset: -2,
            second_chroma_qp_index_offset: 7,
            flags: PpsFlags::ENTROPY_CODING_MODE
                | PpsFlags::TRANSFORM_8X8_MODE
                | PpsFlags::SCALING_MATRIX_PRESENT,
        };
        let mut buf = [0u8; 8];
        let mut w = BitWriter::new(&mut buf, 0).unwrap();
        write_pps(&mut w, &pps).unwrap();
        assert_eq!(w.position(), PPS_BITS);

        assert_eq!(read_bits(&buf, 0, 8), 0xff);
        assert_eq!(read_bits(&buf, 8, 1), 1);
        assert_eq!(read_bits(&buf, 9, 1), 0);
        assert_eq!(read_bits(&buf, 10, 5), 3);
        assert_eq!(read_bits(&buf, 15, 5), 1);
        assert_eq!(read_bits(&buf, 20, 1), 0);
        assert_eq!(read_bits(&buf, 21, 2), 2);
        assert_eq!(read_bits(&buf, 23, 7), 0x66);
        assert_eq!(read_bits(&buf, 30, 6), 5);
        assert_eq!(read_bits(&buf, 36, 5), 0x1E);
        assert_eq!(read_bits(&buf, 41, 3), 0b001);
        assert_eq!(read_bits(&buf, 44, 5), 7);
        assert_eq!(read_bits(&buf, 49, 1), 1);
    }

    #[test]
    fn test_pps_tail() {
        let mut decode = H264DecodeParams::default();
        decode.dpb[0] = DpbEntry::long_term(1);
        decode.dpb[3] = DpbEntry::short_term(2);
        decode.dpb[15] = DpbEntry::long_term(3);

        let mut buf = [0xFFu8; 9];
        let mut w = BitWriter::new(&mut buf, 0).unwrap();
        write_pps_tail(&mut w, 0x1234_5678, &decode).unwrap();
        assert_eq!(w.position(), PPS_TAIL_BITS);
        assert_eq!(buf, [0x12, 0x34, 0x56, 0x78, 0x80, 0x01, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_param_set_is_contiguous() {
        let mut buf = [0u8; 32];
        let mut w = BitWriter::new(&mut buf, 0).unwrap();
        write_param_set(
            &mut w,
            &qvga_sps(),
            &H264Pps::default(),
            0xCAFE_0000,
            &H264DecodeParams::default(),
        )
        .unwrap();
        assert_eq!(w.position(), SPS_BITS + PPS_BITS + PPS_TAIL_BITS);
        assert_eq!(read_bits(&buf, SPS_BITS, 8), 0xff);
        assert_eq!(read_bits(&buf, SPS_BITS + PPS_BITS, 32), 0xCAFE_0000);
    }

    #[test]
    fn test_fill_rps_list_all_inactive() {
        let decode = H264DecodeParams::default();
        let list = [0u8; REF_LIST_SIZE];
        let mut buf = [0xFFu8; 28];
        let mut w = BitWriter::new(&mut buf, 0).unwrap();
        fill_rps_list(&mut w, &list, &decode).unwrap();
        assert_eq!(w.position(), REF_LIST_SIZE * RPS_ENTRY_BITS);
        assert_eq!(buf, [0u8; 28]);
    }

    #[test]
    fn test_fill_rps_list_active_entries() {
        let mut decode = H264DecodeParams::default();
        decode.dpb[0] = DpbEntry::short_term(0);
        decode.dpb[15] = DpbEntry::short_term(1);
        let mut list = [0xFFu8; REF_LIST_SIZE];
        list[0] = 15;
        list[1] = 0;
        list[2] = 4;

        let mut buf = [0u8; 28];
        let mut w = BitWriter::new(&mut buf, 0).unwrap();
        fill_rps_list(&mut w, &list, &decode).unwrap();

        assert_eq!(read_bits(&buf, 0, 5), 15 | 16);
        assert_eq!(read_bits(&buf, 5, 2), 0);
        assert_eq!(read_bits(&buf, 7, 5), 16);
        assert_eq!(read_bits(&buf, 14, 7), 0);
        assert!(buf[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_rps_frame_num_wraps() {
        let sps = H264Sps::default();
        let mut decode = H264DecodeParams::default();
        decode.dpb[0] = DpbEntry::short_term(20);
        decode.dpb[1] = DpbEntry::short_term(15);
        decode.dpb[2] = DpbEntry::short_term(16);
        decode.dpb[3] = DpbEntry {
            frame_num: 7,
            ..Default::default()
        };

        let mut buf = [0u8; 96];
        let mut w = BitWriter::new(&mut buf, 0).unwrap();
        write_rps(&mut w, &sps, &H264SliceParams::default(), &decode).unwrap();
        assert_eq!(w.position(), RPS_BITS);

        assert_eq!(read_bits(&buf, 0, 16), 4);
        assert_eq!(read_bits(&buf, 16, 16), 15);
        assert_eq!(read_bits(&buf, 32, 16), 0);
        assert_eq!(read_bits(&buf, 48, 16), 0);
    }

    #[test]
    fn test_rps_lists_by_slice_type() {
        let sps = H264Sps {
            log2_max_frame_num_minus4: 4,
            ..Default::default()
        };
        let mut decode = H264DecodeParams::default();
        decode.dpb[1] = DpbEntry::short_term(1);
        decode.dpb[2] = DpbEntry::short_term(2);

        let mut slice = H264SliceParams {
            ref_pic_list0: [0xFF; REF_LIST_SIZE],
            ref_pic_list1: [0xFF; REF_LIST_SIZE],
            ..Default::default()
        };
        slice.ref_pic_list0[0] = 1;
        slice.ref_pic_list1[0] = 2;

        let list0_pos = DPB_SIZE * 16 + 32;
        let list1_pos = list0_pos + REF_LIST_SIZE * RPS_ENTRY_BITS;

        for (slice_type, l0, l1) in [
            (SliceType::I, 0, 0),
            (SliceType::P, 1 | 16, 0),
            (SliceType::B, 1 | 16, 2 | 16),
        ] {
            slice.slice_type = slice_type;
            let mut buf = [0xAAu8; 92];
            let mut w = BitWriter::new(&mut buf, 0).unwrap();
            write_rps(&mut w, &sps, &slice, &decode).unwrap();
            assert_eq!(w.position(), RPS_BITS);
            assert_eq!(read_bits(&buf, list0_pos, 5), l0, "{slice_type:?}");
            assert_eq!(read_bits(&buf, list1_pos, 5), l1, "{slice_type:?}");
        }
    }
}
