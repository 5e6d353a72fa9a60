//! バケット表
//!
//! 完全ハッシュで添字付けされる固定長の配列で、Nグラム1つにつき
//! フィンガープリント16ビットと圧縮済み頻度16ビットの4バイトだけを
//! 保持します。構築集合に含まれないキーの照会は、フィンガープリントの
//! 不一致により約`2^-16`の偽陽性率で頻度0として扱われます。

use bincode::{Decode, Encode};

use crate::errors::{KoseiError, Result};
use crate::model::counts::{pack_count, unpack_count, MAX_REAL_COUNT};
use crate::model::keys::{fingerprint, serialized_bytes, NgramKey};
use crate::model::perfect_hash::PerfectHash;

/// バケット1つぶんのデータ。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Decode, Encode)]
pub(crate) struct Bucket {
    /// シリアライズ済みキーの16ビットフィンガープリント
    pub(crate) fingerprint: u16,
    /// 圧縮済み頻度
    pub(crate) packed: u16,
}

/// 完全ハッシュで添字付けされるバケットの表。
#[derive(Debug, Default, Decode, Encode)]
pub(crate) struct BucketTable {
    buckets: Vec<Bucket>,
}

impl BucketTable {
    /// 指定した個数のゼロ初期化済みバケットを持つ表を生成します。
    pub(crate) fn with_len(len: u32) -> Self {
        Self {
            buckets: vec![Bucket::default(); len as usize],
        }
    }

    /// キーの頻度を表に書き込みます。
    ///
    /// 完全ハッシュの構築集合に含まれるキーに対してのみ呼び出せます。
    ///
    /// # エラー
    ///
    /// キーがバケットにハッシュされない場合、またはバケット番号が範囲外の
    /// 場合にエラーを返します。どちらも内部不変条件の違反です。
    pub(crate) fn store(&mut self, ph: &PerfectHash, key: NgramKey, count: u64) -> Result<()> {
        let hash_key = key.hash_key();
        let bytes = serialized_bytes(&hash_key);
        let bucket = ph.hash(&hash_key).ok_or_else(|| {
            KoseiError::invalid_state(
                "a trained key does not hash to any bucket",
                format!("{:?}", key),
            )
        })?;
        let buckets_len = self.buckets.len();
        let slot = self.buckets.get_mut(bucket as usize).ok_or_else(|| {
            KoseiError::invalid_state(
                "a bucket index exceeds the table size",
                format!("{} >= {}", bucket, buckets_len),
            )
        })?;
        *slot = Bucket {
            fingerprint: fingerprint(bytes),
            packed: pack_count(count.min(u64::from(MAX_REAL_COUNT)) as u32),
        };
        Ok(())
    }

    /// キーの頻度の推定値を照会します。
    ///
    /// キーがバケットにハッシュされない場合、またはフィンガープリントが
    /// 一致しない場合は0を返します。
    #[inline(always)]
    pub(crate) fn count(&self, ph: &PerfectHash, key: NgramKey) -> u32 {
        let hash_key = key.hash_key();
        let bytes = serialized_bytes(&hash_key);
        let Some(bucket) = ph.hash(&hash_key) else {
            return 0;
        };
        match self.buckets.get(bucket as usize) {
            Some(slot) if slot.fingerprint == fingerprint(bytes) => unpack_count(slot.packed),
            _ => 0,
        }
    }

    /// バケット数を返します。
    #[inline(always)]
    pub(crate) fn len(&self) -> usize {
        self.buckets.len()
    }

    /// 内部状態をクリアします。
    pub(crate) fn clear(&mut self) {
        self.buckets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_table(entries: &[(NgramKey, u64)]) -> (PerfectHash, BucketTable) {
        let keys = entries.iter().map(|(k, _)| k.hash_key()).collect();
        let ph = PerfectHash::build(keys).unwrap();
        let mut table = BucketTable::with_len(ph.buckets_number());
        for &(key, count) in entries {
            table.store(&ph, key, count).unwrap();
        }
        (ph, table)
    }

    #[test]
    fn test_store_and_lookup() {
        let entries = [
            (NgramKey::Gram1(0), 2u64),
            (NgramKey::Gram1(1), 1),
            (NgramKey::Gram2(0, 1), 1),
            (NgramKey::Gram3(0, 1, 2), 1),
        ];
        let (ph, table) = build_table(&entries);

        assert_eq!(table.len(), 4);
        for &(key, count) in &entries {
            assert_eq!(u64::from(table.count(&ph, key)), count);
        }
    }

    #[test]
    fn test_unseen_keys_count_zero() {
        let entries = [(NgramKey::Gram1(0), 2u64), (NgramKey::Gram2(0, 1), 1)];
        let (ph, table) = build_table(&entries);

        assert_eq!(table.count(&ph, NgramKey::Gram2(1, 0)), 0);
        assert_eq!(table.count(&ph, NgramKey::Gram3(5, 6, 7)), 0);
    }

    #[test]
    fn test_huge_counts_saturate() {
        let entries = [(NgramKey::Gram1(0), u64::MAX)];
        let (ph, table) = build_table(&entries);
        let estimate = table.count(&ph, NgramKey::Gram1(0));
        assert!(estimate >= MAX_REAL_COUNT / 2);
    }
}
