//! H.264 参数集编码
//!
//! 把 SPS、PPS、参考图像集 (RPS) 和量化矩阵序列化成解码器硬件直接读取的
//! 原始参数格式。这不是 Annex-B 码流：没有起始码、没有防竞争字节，
//! 也没有 RBSP 尾部比特。字段顺序和位宽就是硬件接口本身，
//! 输出长度完全由字段布局决定。
//!
//! 各编码函数按固定布局写入 [`BitWriter`](crate::rbsp::BitWriter)，
//! 任何一次写入失败都会中止整个编码，目标缓冲区内容此时未定义。

mod ps;
mod scaling;
mod types;

pub use ps::{
    PPS_BITS, PPS_TAIL_BITS, RPS_BITS, RPS_ENTRY_BITS, SPS_BITS, fill_rps_list, write_param_set,
    write_pps, write_pps_tail, write_rps, write_sps,
};
pub use scaling::{SCALING_LIST_SIZE, ZIGZAG_4X4, ZIGZAG_8X8, update_scaling_list};
pub use types::*;
