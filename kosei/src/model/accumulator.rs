//! Nグラムの計数
//!
//! ID列に変換された文のストリームから、1・2・3グラムの正確な出現頻度と
//! 総単語数を集計します。文境界のパディングは挿入しません（文末の扱いは
//! 採点時の番兵トークンで表現されます）。

use hashbrown::HashMap;

/// 学習中のNグラム頻度表。
///
/// 頻度は学習中は正確な64ビット値で保持され、バケット表への書き込み時に
/// 初めて非可逆圧縮されます。
#[derive(Debug, Default)]
pub(crate) struct NgramCounts {
    pub(crate) grams1: HashMap<u32, u64>,
    pub(crate) grams2: HashMap<(u32, u32), u64>,
    pub(crate) grams3: HashMap<(u32, u32, u32), u64>,
    pub(crate) total_words: u64,
}

impl NgramCounts {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// 1文ぶんのID列を集計に加えます。
    pub(crate) fn accumulate(&mut self, sentence: &[u32]) {
        for &w in sentence {
            *self.grams1.entry(w).or_insert(0) += 1;
            self.total_words += 1;
        }
        for pair in sentence.windows(2) {
            *self.grams2.entry((pair[0], pair[1])).or_insert(0) += 1;
        }
        for triple in sentence.windows(3) {
            *self
                .grams3
                .entry((triple[0], triple[1], triple[2]))
                .or_insert(0) += 1;
        }
    }

    /// 頻度が`min_word_freq`未満のエントリを3つの表すべてから取り除き、
    /// 1グラムのエントリを失った単語IDの一覧を返します。
    ///
    /// 呼び出し側は返されたIDを語彙からも取り除く必要があります。
    pub(crate) fn prune(&mut self, min_word_freq: u64) -> Vec<u32> {
        let removed_words: Vec<u32> = self
            .grams1
            .iter()
            .filter(|(_, &count)| count < min_word_freq)
            .map(|(&id, _)| id)
            .collect();
        self.grams1.retain(|_, count| *count >= min_word_freq);
        self.grams2.retain(|_, count| *count >= min_word_freq);
        self.grams3.retain(|_, count| *count >= min_word_freq);
        removed_words
    }

    /// 3つの表のキー数の合計を返します。
    pub(crate) fn num_keys(&self) -> usize {
        self.grams1.len() + self.grams2.len() + self.grams3.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate_counts_all_arities() {
        let mut counts = NgramCounts::new();
        // "the cat sat on the mat"
        counts.accumulate(&[0, 1, 2, 3, 0, 4]);

        assert_eq!(counts.total_words, 6);
        assert_eq!(counts.grams1.len(), 5);
        assert_eq!(counts.grams1[&0], 2);
        assert_eq!(counts.grams1[&1], 1);
        assert_eq!(counts.grams2.len(), 5);
        assert_eq!(counts.grams2[&(0, 1)], 1);
        assert_eq!(counts.grams3.len(), 4);
        assert_eq!(counts.grams3[&(0, 1, 2)], 1);
    }

    #[test]
    fn test_short_sentences_produce_no_higher_grams() {
        let mut counts = NgramCounts::new();
        counts.accumulate(&[7]);
        assert_eq!(counts.total_words, 1);
        assert!(counts.grams2.is_empty());
        assert!(counts.grams3.is_empty());

        counts.accumulate(&[7, 8]);
        assert_eq!(counts.grams2.len(), 1);
        assert!(counts.grams3.is_empty());
    }

    #[test]
    fn test_prune_reports_removed_words() {
        let mut counts = NgramCounts::new();
        counts.accumulate(&[0, 1, 2, 3, 0, 4]);
        let mut removed = counts.prune(2);
        removed.sort_unstable();

        assert_eq!(removed, [1, 2, 3, 4]);
        assert_eq!(counts.grams1.len(), 1);
        assert!(counts.grams2.is_empty());
        assert!(counts.grams3.is_empty());
        // 総単語数は枝刈りの影響を受けない
        assert_eq!(counts.total_words, 6);
    }
}
