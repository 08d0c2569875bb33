//! H.264 参数集数据结构定义

use bitflags::bitflags;

/// DPB (解码图像缓冲) 槽位数量
pub const DPB_SIZE: usize = 16;

/// 每个参考图像列表的槽位数量
pub const REF_LIST_SIZE: usize = 32;

/// `constraint_set_flags` 中的 constraint_set3_flag
pub const CONSTRAINT_SET3_FLAG: u8 = 1 << 3;

bitflags! {
    /// SPS 标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SpsFlags: u32 {
        const DELTA_PIC_ORDER_ALWAYS_ZERO = 1 << 0;
        const FRAME_MBS_ONLY = 1 << 1;
        const MB_ADAPTIVE_FRAME_FIELD = 1 << 2;
        const DIRECT_8X8_INFERENCE = 1 << 3;
    }

    /// PPS 标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PpsFlags: u32 {
        const ENTROPY_CODING_MODE = 1 << 0;
        const BOTTOM_FIELD_PIC_ORDER_IN_FRAME_PRESENT = 1 << 1;
        const WEIGHTED_PRED = 1 << 2;
        const DEBLOCKING_FILTER_CONTROL_PRESENT = 1 << 3;
        const CONSTRAINED_INTRA_PRED = 1 << 4;
        const REDUNDANT_PIC_CNT_PRESENT = 1 << 5;
        const TRANSFORM_8X8_MODE = 1 << 6;
        const SCALING_MATRIX_PRESENT = 1 << 7;
    }

    /// DPB 条目标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DpbFlags: u32 {
        const VALID = 1 << 0;
        /// 槽位正被用作参考帧；未置位即为空闲槽位
        const ACTIVE = 1 << 1;
        const LONG_TERM = 1 << 2;
        const FIELD = 1 << 3;
    }
}

/// 序列参数集
#[derive(Debug, Clone, Copy, Default)]
pub struct H264Sps {
    pub profile_idc: u8,
    pub constraint_set_flags: u8,
    pub chroma_format_idc: u8,
    pub bit_depth_luma_minus8: u8,
    pub bit_depth_chroma_minus8: u8,
    pub log2_max_frame_num_minus4: u8,
    pub max_num_ref_frames: u8,
    pub pic_order_cnt_type: u8,
    pub log2_max_pic_order_cnt_lsb_minus4: u8,
    pub pic_width_in_mbs_minus1: u16,
    pub pic_height_in_map_units_minus1: u16,
    pub flags: SpsFlags,
}

impl H264Sps {
    /// frame_num 的取模基数 `2^(log2_max_frame_num_minus4 + 4)`
    ///
    /// 超出 32 位时返回 `None`。
    pub fn max_frame_num(&self) -> Option<u32> {
        1u32.checked_shl(u32::from(self.log2_max_frame_num_minus4) + 4)
    }
}

/// 图像参数集
///
/// QP 相关字段按原始值写入硬件，不做偏置。
#[derive(Debug, Clone, Copy, Default)]
pub struct H264Pps {
    pub num_ref_idx_l0_default_active_minus1: u8,
    pub num_ref_idx_l1_default_active_minus1: u8,
    pub weighted_bipred_idc: u8,
    pub pic_init_qp_minus26: i8,
    pub pic_init_qs_minus26: i8,
    pub chroma_qp_index_offset: i8,
    pub second_chroma_qp_index_offset: i8,
    pub flags: PpsFlags,
}

/// DPB 条目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DpbEntry {
    pub frame_num: u16,
    pub flags: DpbFlags,
}

impl DpbEntry {
    /// 创建一个处于使用状态的短期参考条目
    pub const fn short_term(frame_num: u16) -> Self {
        Self {
            frame_num,
            flags: DpbFlags::VALID.union(DpbFlags::ACTIVE),
        }
    }

    /// 创建一个处于使用状态的长期参考条目
    pub const fn long_term(frame_num: u16) -> Self {
        Self {
            frame_num,
            flags: DpbFlags::VALID
                .union(DpbFlags::ACTIVE)
                .union(DpbFlags::LONG_TERM),
        }
    }

    pub fn is_active(&self) -> bool {
        self.flags.contains(DpbFlags::ACTIVE)
    }

    pub fn is_long_term(&self) -> bool {
        self.flags.contains(DpbFlags::LONG_TERM)
    }
}

/// 解码参数
#[derive(Debug, Clone, Copy, Default)]
pub struct H264DecodeParams {
    /// 固定 16 个槽位，未使用的槽位不带 [`DpbFlags::ACTIVE`]
    pub dpb: [DpbEntry; DPB_SIZE],
}

impl H264DecodeParams {
    /// 长期参考掩码：第 `i` 位置位当且仅当 `dpb[i]` 是长期参考
    pub fn long_term_mask(&self) -> u16 {
        self.dpb
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_long_term())
            .fold(0u16, |mask, (i, _)| mask | (1u16 << i))
    }
}

/// 条带类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SliceType {
    P = 0,
    B = 1,
    #[default]
    I = 2,
    Sp = 3,
    Si = 4,
}

impl SliceType {
    /// 该条带类型使用的参考列表数量
    pub fn ref_list_count(self) -> usize {
        match self {
            SliceType::I | SliceType::Si => 0,
            SliceType::P | SliceType::Sp => 1,
            SliceType::B => 2,
        }
    }
}

impl TryFrom<u8> for SliceType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value >= 10 {
            return Err(());
        }
        // slice_type 5..=9 与 0..=4 含义相同
        match value % 5 {
            0 => Ok(Self::P),
            1 => Ok(Self::B),
            2 => Ok(Self::I),
            3 => Ok(Self::Sp),
            _ => Ok(Self::Si),
        }
    }
}

/// 条带参数
#[derive(Debug, Clone, Copy, Default)]
pub struct H264SliceParams {
    pub slice_type: SliceType,
    /// 元素为 DPB 槽位下标
    pub ref_pic_list0: [u8; REF_LIST_SIZE],
    pub ref_pic_list1: [u8; REF_LIST_SIZE],
}

/// 量化矩阵，按光栅顺序存放
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct H264ScalingMatrix {
    pub scaling_list_4x4: [[u8; 16]; 6],
    pub scaling_list_8x8: [[u8; 64]; 2],
}

impl H264ScalingMatrix {
    /// 平坦矩阵 (所有量化值为 16)
    pub const fn flat() -> Self {
        Self {
            scaling_list_4x4: [[16; 16]; 6],
            scaling_list_8x8: [[16; 64]; 2],
        }
    }
}

impl Default for H264ScalingMatrix {
    fn default() -> Self {
        Self::flat()
    }
}
