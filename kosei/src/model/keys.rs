//! Nグラムキーのシリアライズとフィンガープリント
//!
//! 1〜3グラムのキーを固定幅リトルエンディアンのバイト列に変換します。
//! 単語IDごとに32ビットを使うため、キー長（4・8・12バイト）だけで
//! アリティが区別でき、異なるアリティのキーが同じバイト列になることは
//! ありません。
//!
//! 完全ハッシュには、このバイト列に長さタグを付けてゼロ詰めした
//! 固定幅の正規形[`HashKey`]を渡します。固定幅のため、照会は
//! スタック上の配列だけで行われ、ホットパスでヒープ確保が発生しません。

use xxhash_rust::xxh3::xxh3_64;

/// シリアライズ済みキーの最大長（3グラム = 12バイト）。
pub(crate) const KEY_BUF_LEN: usize = 12;

/// 正規形キーの長さ（長さタグ1バイト + キー本体12バイト）。
pub(crate) const HASH_KEY_LEN: usize = KEY_BUF_LEN + 1;

/// 完全ハッシュのキーとして使う固定幅の正規形。
///
/// 先頭バイトがシリアライズ済みキーの長さ、残りがゼロ詰めされた
/// キー本体です。長さタグにより、あるキーのバイト列が別のアリティの
/// キーの接頭辞になっていても正規形としては衝突しません。
pub(crate) type HashKey = [u8; HASH_KEY_LEN];

/// Nグラムキー。
///
/// フィールドは語彙が割り当てた単語IDです。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum NgramKey {
    /// 1グラム
    Gram1(u32),
    /// 2グラム
    Gram2(u32, u32),
    /// 3グラム
    Gram3(u32, u32, u32),
}

impl NgramKey {
    /// キーをバッファにシリアライズし、書き込んだ長さを返します。
    #[inline(always)]
    pub(crate) fn write(&self, buf: &mut [u8; KEY_BUF_LEN]) -> usize {
        match *self {
            Self::Gram1(w1) => {
                buf[0..4].copy_from_slice(&w1.to_le_bytes());
                4
            }
            Self::Gram2(w1, w2) => {
                buf[0..4].copy_from_slice(&w1.to_le_bytes());
                buf[4..8].copy_from_slice(&w2.to_le_bytes());
                8
            }
            Self::Gram3(w1, w2, w3) => {
                buf[0..4].copy_from_slice(&w1.to_le_bytes());
                buf[4..8].copy_from_slice(&w2.to_le_bytes());
                buf[8..12].copy_from_slice(&w3.to_le_bytes());
                12
            }
        }
    }

    /// キーを固定幅の正規形にシリアライズします。
    #[inline(always)]
    pub(crate) fn hash_key(&self) -> HashKey {
        let mut buf = [0u8; KEY_BUF_LEN];
        let len = self.write(&mut buf);
        let mut key = [0u8; HASH_KEY_LEN];
        key[0] = len as u8;
        key[1..].copy_from_slice(&buf);
        key
    }
}

/// 正規形キーからシリアライズ済みバイト列を取り出します。
#[inline(always)]
pub(crate) fn serialized_bytes(key: &HashKey) -> &[u8] {
    &key[1..1 + usize::from(key[0])]
}

/// シリアライズ済みキーの16ビットフィンガープリントを計算します。
///
/// 64ビットの非暗号学的ダイジェストの下位16ビットです。バケットに値と
/// 並べて保存され、完全ハッシュの構築集合に含まれないキーの照会を
/// 約`1 - 2^-16`の確率で検出します。
#[inline(always)]
pub(crate) fn fingerprint(bytes: &[u8]) -> u16 {
    xxh3_64(bytes) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_lengths() {
        let mut buf = [0u8; KEY_BUF_LEN];
        assert_eq!(NgramKey::Gram1(1).write(&mut buf), 4);
        assert_eq!(NgramKey::Gram2(1, 2).write(&mut buf), 8);
        assert_eq!(NgramKey::Gram3(1, 2, 3).write(&mut buf), 12);
    }

    #[test]
    fn test_little_endian_layout() {
        let mut buf = [0u8; KEY_BUF_LEN];
        let len = NgramKey::Gram2(0x0102_0304, 0x0a0b_0c0d).write(&mut buf);
        assert_eq!(&buf[..len], &[0x04, 0x03, 0x02, 0x01, 0x0d, 0x0c, 0x0b, 0x0a]);
    }

    #[test]
    fn test_hash_key_embeds_serialized_bytes() {
        let key = NgramKey::Gram3(1, u32::MAX - 1, 42);
        let mut buf = [0u8; KEY_BUF_LEN];
        let len = key.write(&mut buf);

        let hash_key = key.hash_key();
        assert_eq!(usize::from(hash_key[0]), len);
        assert_eq!(serialized_bytes(&hash_key), &buf[..len]);
    }

    #[test]
    fn test_arities_are_prefix_distinct() {
        // 1グラムのバイト列は同じ単語で始まる2グラムの接頭辞になるが、
        // 長さタグにより正規形としては衝突しない
        let g1 = NgramKey::Gram1(7).hash_key();
        let g2 = NgramKey::Gram2(7, 0).hash_key();
        assert_ne!(g1, g2);
        assert_eq!(&serialized_bytes(&g2)[..4], serialized_bytes(&g1));
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let hash_key = NgramKey::Gram2(3, 4).hash_key();
        let bytes = serialized_bytes(&hash_key);
        assert_eq!(fingerprint(bytes), fingerprint(bytes));
    }

    #[test]
    fn test_fingerprints_spread() {
        // 16ビットでも大半のキーは区別できる
        let distinct: std::collections::HashSet<u16> = (0..100u32)
            .map(|w| {
                let hash_key = NgramKey::Gram1(w).hash_key();
                fingerprint(serialized_bytes(&hash_key))
            })
            .collect();
        assert!(distinct.len() >= 95, "only {} distinct fingerprints", distinct.len());
    }
}
