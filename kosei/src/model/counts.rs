//! 頻度の非可逆圧縮コーデック
//!
//! 32ビットの出現頻度を16ビットに詰め込みます。`x^(1/5)`の曲線により、
//! 平滑化の結果を左右する小さい頻度ほど高い量子化解像度が割り当てられ、
//! 巨大な頻度は量子化の上限付近のバケットを共有します。

/// 表現可能な頻度の上限。これを超える頻度は上限に切り詰められます。
pub const MAX_REAL_COUNT: u32 = 1 << 28;

/// 量子化レベル数。
pub const MAX_QUANT_COUNT: u32 = 1 << 16;

/// 頻度を16ビットの量子化値に詰め込みます。
///
/// すべての演算は64ビット浮動小数点で行われます。量子化値は頻度に対して
/// 単調非減少で、`pack_count(0) == 0`です。
#[inline]
pub fn pack_count(count: u32) -> u16 {
    let x = f64::from(count.min(MAX_REAL_COUNT)) / f64::from(MAX_REAL_COUNT);
    let q = (f64::from(MAX_QUANT_COUNT) * x.powf(0.2)).round();
    q.min(f64::from(u16::MAX)) as u16
}

/// 量子化値から頻度の推定値を復元します。
///
/// `unpack_count(pack_count(c))`は`c`に対して単調で、`unpack_count(0) == 0`
/// です。1を超える頻度の復元は非可逆です。
#[inline]
pub fn unpack_count(packed: u16) -> u32 {
    let r = f64::from(packed) / f64::from(MAX_QUANT_COUNT);
    (f64::from(MAX_REAL_COUNT) * r.powi(5)).ceil() as u32
}
