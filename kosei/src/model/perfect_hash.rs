//! 最小完全ハッシュ
//!
//! このモジュールは、学習時に観測されたすべてのNグラムキーの集合に対する
//! 最小完全ハッシュの構築と照会を提供します。構築アルゴリズム自体は
//! `boomphf`（BBHash系）に委譲し、ここでは固定の契約だけを公開します:
//! 構築集合の各キーは`[0, buckets_number)`の互いに異なる値にハッシュされ、
//! 集合外のキーは`None`または範囲内の任意の値を返します（後者はバケット側の
//! フィンガープリントが検出します）。
//!
//! キーは固定幅の正規形[`HashKey`]で渡します。照会型が構築型と一致する
//! ため、ホットパスの照会はスタック上の配列だけで行われます。

use std::io::{Read, Write};

use boomphf::Mphf;

use crate::common::{self, PERFECT_HASH_VERSION};
use crate::errors::{KoseiError, Result};
use crate::model::keys::HashKey;

/// BBHash構築のガンマパラメータ。大きいほど構築が速く、表が疎になります。
const GAMMA: f64 = 1.7;

/// 正規形Nグラムキーに対する最小完全ハッシュ。
pub struct PerfectHash {
    mph: Mphf<HashKey>,
    buckets: u32,
}

impl PerfectHash {
    /// 互いに異なるキーの集合から完全ハッシュを構築します。
    ///
    /// # 引数
    ///
    /// * `keys` - 正規形キーの集合。重複を含んではいけません。
    ///
    /// # エラー
    ///
    /// キー数が`u32`で表現できない場合にエラーを返します。
    pub fn build(keys: Vec<HashKey>) -> Result<Self> {
        let buckets = u32::try_from(keys.len())?;
        let mph = Mphf::new(GAMMA, &keys);
        Ok(Self { mph, buckets })
    }

    /// キーのバケット番号を計算します。
    ///
    /// 構築集合に含まれるキーに対しては`[0, buckets_number)`の一意な値を
    /// 返します。集合外のキーに対しては`None`か、他のキーと衝突する
    /// 任意の値を返すことがあります。
    #[inline(always)]
    pub fn hash(&self, key: &HashKey) -> Option<u32> {
        self.mph.try_hash(key).map(|h| h as u32)
    }

    /// バケット数（構築集合のキー数に等しい）を返します。
    #[inline(always)]
    pub const fn buckets_number(&self) -> u32 {
        self.buckets
    }

    /// 完全ハッシュの状態をバージョン付きブロックとして書き出します。
    pub(crate) fn write<W>(&self, wtr: &mut W) -> Result<()>
    where
        W: Write,
    {
        let config = common::bincode_config();
        bincode::encode_into_std_write(PERFECT_HASH_VERSION, wtr, config)?;
        bincode::encode_into_std_write(self.buckets, wtr, config)?;
        bincode::serde::encode_into_std_write(&self.mph, wtr, config)?;
        Ok(())
    }

    /// バージョン付きブロックから完全ハッシュの状態を読み込みます。
    ///
    /// # エラー
    ///
    /// ブロックのバージョンが一致しない場合、またはデコードに失敗した場合に
    /// エラーを返します。
    pub(crate) fn read<R>(rdr: &mut R) -> Result<Self>
    where
        R: Read,
    {
        let config = common::bincode_config();
        let version: u16 = bincode::decode_from_std_read(rdr, config)?;
        if version != PERFECT_HASH_VERSION {
            return Err(KoseiError::invalid_format(
                "rdr",
                "the perfect hash block version mismatches.",
            ));
        }
        let buckets: u32 = bincode::decode_from_std_read(rdr, config)?;
        let mph: Mphf<HashKey> = bincode::serde::decode_from_std_read(rdr, config)?;
        Ok(Self { mph, buckets })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::keys::HASH_KEY_LEN;

    fn sample_key(value: u32) -> HashKey {
        let mut key = [0u8; HASH_KEY_LEN];
        key[0] = 4;
        key[1..5].copy_from_slice(&value.to_le_bytes());
        key
    }

    fn sample_keys(n: u32) -> Vec<HashKey> {
        (0..n).map(sample_key).collect()
    }

    #[test]
    fn test_member_keys_map_to_unique_buckets() {
        let keys = sample_keys(1000);
        let ph = PerfectHash::build(keys.clone()).unwrap();
        assert_eq!(ph.buckets_number(), 1000);

        let mut seen = vec![false; 1000];
        for key in &keys {
            let bucket = ph.hash(key).expect("member key must hash") as usize;
            assert!(bucket < 1000);
            assert!(!seen[bucket], "bucket {} assigned twice", bucket);
            seen[bucket] = true;
        }
    }

    #[test]
    fn test_foreign_keys_stay_in_range() {
        let ph = PerfectHash::build(sample_keys(100)).unwrap();
        for i in 1000u32..2000 {
            if let Some(bucket) = ph.hash(&sample_key(i)) {
                assert!(bucket < ph.buckets_number());
            }
        }
    }

    #[test]
    fn test_block_round_trip() {
        let keys = sample_keys(100);
        let ph = PerfectHash::build(keys.clone()).unwrap();

        let mut buf = Vec::new();
        ph.write(&mut buf).unwrap();
        let loaded = PerfectHash::read(&mut buf.as_slice()).unwrap();

        assert_eq!(loaded.buckets_number(), ph.buckets_number());
        for key in &keys {
            assert_eq!(loaded.hash(key), ph.hash(key));
        }
    }

    #[test]
    fn test_version_mismatch_is_rejected() {
        let ph = PerfectHash::build(sample_keys(10)).unwrap();
        let mut buf = Vec::new();
        ph.write(&mut buf).unwrap();
        buf[0] = buf[0].wrapping_add(1);
        assert!(PerfectHash::read(&mut buf.as_slice()).is_err());
    }
}
