//! トライグラム言語モデル
//!
//! このモジュールは、スペル訂正エンジンの中核となるコンパクトな
//! トライグラム言語モデルを提供します。主な機能:
//!
//! - コーパスからの学習（語彙の構築、Nグラムの計数、低頻度語の枝刈り）
//! - 全Nグラムキーに対する最小完全ハッシュとバケット表の構築
//! - 加算平滑化されたトライグラム補間による文の対数確率の計算
//! - 固定フォーマットのバイナリモデルファイルへの保存と読み込み
//! - 追加コーパスによる語彙のファインチューニング
//!
//! 学習済みモデルは実質的に不変であり、書き込みが存在しない限り
//! 複数スレッドから同時に照会しても安全です。

pub(crate) mod accumulator;
pub(crate) mod buckets;
pub mod counts;
pub(crate) mod keys;
pub mod perfect_hash;
pub mod vocabulary;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use xxhash_rust::xxh3::xxh3_64;

use crate::common::{self, MODEL_MAGIC, MODEL_VERSION};
use crate::errors::{KoseiError, Result};
use crate::model::accumulator::NgramCounts;
use crate::model::buckets::BucketTable;
use crate::model::keys::{HashKey, NgramKey};
use crate::model::perfect_hash::PerfectHash;
use crate::model::vocabulary::{Vocabulary, UNKNOWN_WORD_ID};
use crate::tokenizer::{lowercase, Tokenizer};

/// 平滑化定数Kのデフォルト値。
pub const DEFAULT_K: f64 = 1.0;

/// 採点できない入力に対して返される番兵スコア。
///
/// 有限のdoubleの最小値であり、実際の文のスコア（対数確率の和）より
/// 必ず小さくなります。空の文、およびすべての単語が未知語である文に
/// 対して返されます。
pub const SCORE_SENTINEL: f64 = f64::MIN;

/// 学習の進捗をログに出す間隔（文数）。
const PROGRESS_LOG_INTERVAL: usize = 500_000;

/// コンパクトなトライグラム言語モデル。
///
/// モデルは空・学習済み・読み込み済みのいずれかの状態を取ります。
/// 学習はすべてのフィールドをコミット時に一括で置き換え、読み込みは
/// 完全に成功するか、モデルを空に戻して失敗します。
pub struct LangModel {
    tokenizer: Tokenizer,
    vocabulary: Vocabulary,
    k: f64,
    total_words: u64,
    vocab_size: u64,
    checksum: u64,
    perfect_hash: Option<PerfectHash>,
    buckets: BucketTable,
}

impl Default for LangModel {
    fn default() -> Self {
        Self::new()
    }
}

impl LangModel {
    /// 空のモデルを生成します。
    pub fn new() -> Self {
        Self {
            tokenizer: Tokenizer::new(),
            vocabulary: Vocabulary::new(),
            k: DEFAULT_K,
            total_words: 0,
            vocab_size: 0,
            checksum: 0,
            perfect_hash: None,
            buckets: BucketTable::default(),
        }
    }

    /// コーパスからモデルを学習します。
    ///
    /// コーパスを文に分割して語彙を構築し、1・2・3グラムを計数した後、
    /// 全キーに対する最小完全ハッシュとバケット表を構築します。
    /// `min_word_freq`が1より大きい場合、頻度がそれ未満のNグラムと単語は
    /// 取り除かれます。
    ///
    /// 失敗した場合、モデルの状態は変化しません。成功した場合、それまでの
    /// 内容は完全に置き換えられます。
    ///
    /// # 引数
    ///
    /// * `corpus_path` - 学習コーパス（テキストファイル）へのパス
    /// * `alphabet_path` - アルファベット定義ファイルへのパス
    /// * `min_word_freq` - 保持する単語・Nグラムの最低頻度
    ///
    /// # エラー
    ///
    /// アルファベットまたはコーパスが読み込めない場合、コーパスから文が
    /// 1つも得られない場合にエラーを返します。
    pub fn train<P1, P2>(
        &mut self,
        corpus_path: P1,
        alphabet_path: P2,
        min_word_freq: u64,
    ) -> Result<()>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
    {
        let train_start_ms = current_time_ms();

        let mut tokenizer = Tokenizer::new();
        tokenizer.load_alphabet(alphabet_path)?;

        log::info!("loading the training corpus");
        let raw = std::fs::read_to_string(corpus_path)?;
        let text = lowercase(&raw);
        drop(raw);

        let sentences = tokenizer.process(&text);
        if sentences.is_empty() {
            return Err(KoseiError::invalid_argument(
                "corpus_path",
                "the corpus produced no sentences.",
            ));
        }
        let input_chars = text.len() as u64;
        let sentence_count = sentences.len() as u64;

        let mut vocabulary = Vocabulary::new();
        let id_sentences: Vec<Vec<u32>> = sentences
            .iter()
            .map(|words| {
                words
                    .iter()
                    .map(|word| vocabulary.get_or_create_id(word))
                    .collect()
            })
            .collect();
        drop(sentences);
        drop(text);

        log::info!("counting n-grams over {} sentences", id_sentences.len());
        let mut counts = NgramCounts::new();
        for (i, sentence) in id_sentences.iter().enumerate() {
            counts.accumulate(sentence);
            if (i + 1) % PROGRESS_LOG_INTERVAL == 0 {
                log::info!("processed {} / {} sentences", i + 1, id_sentences.len());
            }
        }
        drop(id_sentences);

        if min_word_freq > 1 {
            let vocab_before = vocabulary.len();
            let removed = counts.prune(min_word_freq);
            let removed: std::collections::HashSet<u32> = removed.into_iter().collect();
            vocabulary.prune(|id| !removed.contains(&id));
            log::info!(
                "pruned {} words with frequency below {} (vocabulary {} -> {})",
                removed.len(),
                min_word_freq,
                vocab_before,
                vocabulary.len(),
            );
        }
        let vocab_size = counts.grams1.len() as u64;

        log::info!(
            "building the perfect hash over {} keys ({} / {} / {} per arity)",
            counts.num_keys(),
            counts.grams1.len(),
            counts.grams2.len(),
            counts.grams3.len(),
        );
        let mut hash_keys: Vec<HashKey> = Vec::with_capacity(counts.num_keys());
        hash_keys.extend(counts.grams1.keys().map(|&w| NgramKey::Gram1(w).hash_key()));
        hash_keys.extend(
            counts
                .grams2
                .keys()
                .map(|&(w1, w2)| NgramKey::Gram2(w1, w2).hash_key()),
        );
        hash_keys.extend(
            counts
                .grams3
                .keys()
                .map(|&(w1, w2, w3)| NgramKey::Gram3(w1, w2, w3).hash_key()),
        );
        let perfect_hash = PerfectHash::build(hash_keys)?;

        log::info!("filling {} buckets", perfect_hash.buckets_number());
        let mut buckets = BucketTable::with_len(perfect_hash.buckets_number());
        for (&w, &count) in &counts.grams1 {
            buckets.store(&perfect_hash, NgramKey::Gram1(w), count)?;
        }
        for (&(w1, w2), &count) in &counts.grams2 {
            buckets.store(&perfect_hash, NgramKey::Gram2(w1, w2), count)?;
        }
        for (&(w1, w2, w3), &count) in &counts.grams3 {
            buckets.store(&perfect_hash, NgramKey::Gram3(w1, w2, w3), count)?;
        }

        let checksum = train_checksum(
            train_start_ms,
            counts.grams1.len() as u64,
            counts.grams2.len() as u64,
            counts.grams3.len() as u64,
            u64::from(perfect_hash.buckets_number()),
            input_chars,
            sentence_count,
        )?;

        self.tokenizer = tokenizer;
        self.vocabulary = vocabulary;
        self.k = DEFAULT_K;
        self.total_words = counts.total_words;
        self.vocab_size = vocab_size;
        self.checksum = checksum;
        self.perfect_hash = Some(perfect_hash);
        self.buckets = buckets;
        log::info!("training finished");
        Ok(())
    }

    /// テキストの対数確率を計算します。
    ///
    /// テキストをトークナイズし、すべての文の単語を連結した1つの単語列
    /// として採点します。
    pub fn score(&self, text: &str) -> f64 {
        let chars = lowercase(text);
        let sentences = self.tokenizer.process(&chars);
        let words: Vec<&[char]> = sentences.iter().flatten().copied().collect();
        self.score_words(&words)
    }

    /// 単語列の対数確率を計算します。
    ///
    /// 単語列の末尾に未知語の番兵を2つ付け加え、n個のトライグラム窓の
    /// それぞれについて1・2・3グラムの平滑化確率の対数を合計します。
    /// 空の単語列、およびすべての単語が未知語である単語列には
    /// [`SCORE_SENTINEL`]を返します。
    ///
    /// 同じ入力に対しては常にビット単位で同一の値を返します。
    pub fn score_words(&self, words: &[&[char]]) -> f64 {
        let mut sentence: Vec<u32> = words
            .iter()
            .map(|word| self.vocabulary.get_id_no_create(word))
            .collect();
        if sentence.is_empty() || sentence.iter().all(|&id| id == UNKNOWN_WORD_ID) {
            return SCORE_SENTINEL;
        }

        sentence.push(UNKNOWN_WORD_ID);
        sentence.push(UNKNOWN_WORD_ID);

        let mut result = 0.0;
        for i in 0..sentence.len() - 2 {
            result += self.gram1_prob(sentence[i]).ln();
            result += self.gram2_prob(sentence[i], sentence[i + 1]).ln();
            result += self
                .gram3_prob(sentence[i], sentence[i + 1], sentence[i + 2])
                .ln();
        }
        result
    }

    /// モデルをファイルに書き出します。
    ///
    /// # エラー
    ///
    /// モデルが空の場合、またはファイルの作成や書き込みに失敗した場合に
    /// エラーを返します。失敗してもモデルの状態は変化しません。
    pub fn dump<P>(&self, path: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let perfect_hash = self.perfect_hash.as_ref().ok_or_else(|| {
            KoseiError::invalid_state("cannot dump an empty model", "train or load it first")
        })?;
        let config = common::bincode_config();
        let mut wtr = BufWriter::new(File::create(path)?);

        bincode::encode_into_std_write(MODEL_MAGIC, &mut wtr, config)?;
        bincode::encode_into_std_write(MODEL_VERSION, &mut wtr, config)?;

        bincode::encode_into_std_write(&self.tokenizer, &mut wtr, config)?;
        bincode::encode_into_std_write(self.k, &mut wtr, config)?;
        bincode::encode_into_std_write(self.vocabulary.word_map(), &mut wtr, config)?;
        bincode::encode_into_std_write(self.vocabulary.last_word_id(), &mut wtr, config)?;
        bincode::encode_into_std_write(self.total_words, &mut wtr, config)?;
        bincode::encode_into_std_write(self.vocab_size, &mut wtr, config)?;
        bincode::encode_into_std_write(self.checksum, &mut wtr, config)?;
        perfect_hash.write(&mut wtr)?;
        bincode::encode_into_std_write(&self.buckets, &mut wtr, config)?;

        bincode::encode_into_std_write(MODEL_MAGIC, &mut wtr, config)?;
        wtr.flush()?;
        Ok(())
    }

    /// モデルをファイルから読み込みます。
    ///
    /// # エラー
    ///
    /// ファイルを開けない場合、先頭・末尾のマジックナンバーまたは
    /// バージョンが一致しない場合、デコードに失敗した場合にエラーを
    /// 返します。失敗した場合、モデルは空の状態に戻ります。
    pub fn load<P>(&mut self, path: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let result = self.load_inner(path);
        if result.is_err() {
            self.clear();
        }
        result
    }

    fn load_inner<P>(&mut self, path: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let config = common::bincode_config();
        let mut rdr = BufReader::new(File::open(path)?);

        let magic: u64 = bincode::decode_from_std_read(&mut rdr, config)?;
        if magic != MODEL_MAGIC {
            return Err(KoseiError::invalid_format(
                "path",
                "the magic number of the input model mismatches.",
            ));
        }
        let version: u16 = bincode::decode_from_std_read(&mut rdr, config)?;
        if version != MODEL_VERSION {
            return Err(KoseiError::invalid_format(
                "path",
                format!("unsupported model version {}.", version),
            ));
        }

        let tokenizer: Tokenizer = bincode::decode_from_std_read(&mut rdr, config)?;
        let k: f64 = bincode::decode_from_std_read(&mut rdr, config)?;
        let word_to_id: HashMap<Vec<char>, u32> = bincode::decode_from_std_read(&mut rdr, config)?;
        let last_word_id: u32 = bincode::decode_from_std_read(&mut rdr, config)?;
        let total_words: u64 = bincode::decode_from_std_read(&mut rdr, config)?;
        let vocab_size: u64 = bincode::decode_from_std_read(&mut rdr, config)?;
        let checksum: u64 = bincode::decode_from_std_read(&mut rdr, config)?;
        let perfect_hash = PerfectHash::read(&mut rdr)?;
        let buckets: BucketTable = bincode::decode_from_std_read(&mut rdr, config)?;

        let magic: u64 = bincode::decode_from_std_read(&mut rdr, config)?;
        if magic != MODEL_MAGIC {
            return Err(KoseiError::invalid_format(
                "path",
                "the trailing magic number of the input model mismatches.",
            ));
        }
        if buckets.len() != perfect_hash.buckets_number() as usize {
            return Err(KoseiError::invalid_format(
                "path",
                "the bucket table size disagrees with the perfect hash.",
            ));
        }

        self.tokenizer = tokenizer;
        self.vocabulary = Vocabulary::from_parts(word_to_id, last_word_id)?;
        self.k = k;
        self.total_words = total_words;
        self.vocab_size = vocab_size;
        self.checksum = checksum;
        self.perfect_hash = Some(perfect_hash);
        self.buckets = buckets;
        Ok(())
    }

    /// 追加コーパスで語彙をファインチューニングします。
    ///
    /// コーパスに現れなかった単語を語彙から取り除きます。完全ハッシュと
    /// バケット表は再構築されないため、残った単語の学習済み確率は
    /// 変化しません。取り除かれた単語は以後未知語として扱われます。
    ///
    /// # 引数
    ///
    /// * `corpus_path` - ファインチューニング用コーパスへのパス
    /// * `alphabet_path` - アルファベット定義ファイルへのパス
    ///
    /// # エラー
    ///
    /// アルファベットまたはコーパスが読み込めない場合、コーパスから文が
    /// 1つも得られない場合にエラーを返します。
    pub fn finetune_vocab<P1, P2>(&mut self, corpus_path: P1, alphabet_path: P2) -> Result<()>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
    {
        self.tokenizer.load_alphabet(alphabet_path)?;

        let raw = std::fs::read_to_string(corpus_path)?;
        let text = lowercase(&raw);
        let sentences = self.tokenizer.process(&text);
        if sentences.is_empty() {
            return Err(KoseiError::invalid_argument(
                "corpus_path",
                "the finetune corpus produced no sentences.",
            ));
        }

        let survivors: std::collections::HashSet<Vec<char>> = sentences
            .iter()
            .flatten()
            .map(|word| word.to_vec())
            .collect();
        let vocab_before = self.vocabulary.len();
        self.vocabulary.retain_words(|word| survivors.contains(word));
        log::info!(
            "finetuned the vocabulary against {} observed words ({} -> {})",
            survivors.len(),
            vocab_before,
            self.vocabulary.len(),
        );
        Ok(())
    }

    /// 語彙とその頻度を2つのファイルに書き出します。
    ///
    /// `words_path`には`単語,`を、`freqs_path`には同じ順序で`頻度,`を
    /// 書き出します。順序は順方向マップの反復順で、不定です。
    ///
    /// # エラー
    ///
    /// ファイルの作成や書き込みに失敗した場合にエラーを返します。
    pub fn dump_vocab<P1, P2>(&self, words_path: P1, freqs_path: P2) -> Result<()>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
    {
        let mut words_out = BufWriter::new(File::create(words_path)?);
        let mut freqs_out = BufWriter::new(File::create(freqs_path)?);
        for (word, id) in self.vocabulary.iter() {
            let word: String = word.iter().collect();
            write!(words_out, "{},", word)?;
            write!(freqs_out, "{},", self.word_count(id))?;
        }
        words_out.flush()?;
        freqs_out.flush()?;
        Ok(())
    }

    /// モデルを空の状態に戻します。
    pub fn clear(&mut self) {
        self.tokenizer.clear();
        self.vocabulary.clear();
        self.k = DEFAULT_K;
        self.total_words = 0;
        self.vocab_size = 0;
        self.checksum = 0;
        self.perfect_hash = None;
        self.buckets.clear();
    }

    /// 学習実行を識別するチェックサムを返します。
    #[inline(always)]
    pub fn get_checksum(&self) -> u64 {
        self.checksum
    }

    /// 学習コーパスの総単語数を返します。
    #[inline(always)]
    pub fn total_words(&self) -> u64 {
        self.total_words
    }

    /// 学習時に保持された相異なる単語の個数を返します。
    ///
    /// この値は採点の分母に使われる学習実行の要約値であり、語彙の
    /// ファインチューニングでは変化しません。現在の語彙の大きさは
    /// [`vocab_len`](Self::vocab_len)で取得できます。
    #[inline(always)]
    pub fn vocab_size(&self) -> u64 {
        self.vocab_size
    }

    /// 現在の語彙に含まれる単語の個数を返します。
    #[inline(always)]
    pub fn vocab_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// 平滑化定数Kを返します。
    #[inline(always)]
    pub fn k(&self) -> f64 {
        self.k
    }

    /// 単語のIDを返します。未知語には[`UNKNOWN_WORD_ID`]を返します。
    #[inline(always)]
    pub fn get_id_no_create(&self, word: &[char]) -> u32 {
        self.vocabulary.get_id_no_create(word)
    }

    /// IDから単語を引きます。範囲外のIDには空のスパンを返します。
    #[inline(always)]
    pub fn word(&self, id: u32) -> &[char] {
        self.vocabulary.word(id)
    }

    /// 単語の頻度の推定値を返します。
    pub fn word_count(&self, id: u32) -> u32 {
        self.gram1_count(id)
    }

    /// モデルのトークナイザへの参照を返します。
    #[inline(always)]
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    fn gram1_prob(&self, w1: u32) -> f64 {
        let count1 = f64::from(self.gram1_count(w1));
        (count1 + self.k) / (self.total_words as f64 + self.vocab_size as f64)
    }

    fn gram2_prob(&self, w1: u32, w2: u32) -> f64 {
        let count1 = f64::from(self.gram1_count(w1));
        let mut count2 = f64::from(self.gram2_count(w1, w2));
        // 正確な頻度では起こり得ない大小関係はフィンガープリント衝突の
        // 漏れなので、観測なしとして扱う
        if count2 > count1 {
            count2 = 0.0;
        }
        (count2 + self.k) / (count1 + self.total_words as f64)
    }

    fn gram3_prob(&self, w1: u32, w2: u32, w3: u32) -> f64 {
        let count2 = f64::from(self.gram2_count(w1, w2));
        let mut count3 = f64::from(self.gram3_count(w1, w2, w3));
        if count3 > count2 {
            count3 = 0.0;
        }
        (count3 + self.k) / (count2 + self.total_words as f64)
    }

    pub(crate) fn gram1_count(&self, w1: u32) -> u32 {
        if w1 == UNKNOWN_WORD_ID {
            return 0;
        }
        self.hash_count(NgramKey::Gram1(w1))
    }

    pub(crate) fn gram2_count(&self, w1: u32, w2: u32) -> u32 {
        if w1 == UNKNOWN_WORD_ID || w2 == UNKNOWN_WORD_ID {
            return 0;
        }
        self.hash_count(NgramKey::Gram2(w1, w2))
    }

    pub(crate) fn gram3_count(&self, w1: u32, w2: u32, w3: u32) -> u32 {
        if w1 == UNKNOWN_WORD_ID || w2 == UNKNOWN_WORD_ID || w3 == UNKNOWN_WORD_ID {
            return 0;
        }
        self.hash_count(NgramKey::Gram3(w1, w2, w3))
    }

    fn hash_count(&self, key: NgramKey) -> u32 {
        match self.perfect_hash.as_ref() {
            Some(perfect_hash) => self.buckets.count(perfect_hash, key),
            None => 0,
        }
    }
}

/// 学習実行を識別するチェックサムを計算します。
///
/// 学習の要約値のシリアライズに対する64ビットダイジェストです。
/// ファイルの完全性検査ではなく、学習実行の識別に使われます。
fn train_checksum(
    train_start_ms: u64,
    grams1: u64,
    grams2: u64,
    grams3: u64,
    buckets_number: u64,
    input_chars: u64,
    sentence_count: u64,
) -> Result<u64> {
    let payload = bincode::encode_to_vec(
        (
            train_start_ms,
            grams1,
            grams2,
            grams3,
            buckets_number,
            input_chars,
            sentence_count,
        ),
        common::bincode_config(),
    )?;
    Ok(xxh3_64(&payload))
}

fn current_time_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_deterministic() {
        let a = train_checksum(1, 2, 3, 4, 5, 6, 7).unwrap();
        let b = train_checksum(1, 2, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(a, b);
        let c = train_checksum(1, 2, 3, 4, 5, 6, 8).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_empty_model_scores_sentinel() {
        let model = LangModel::new();
        assert_eq!(model.score(""), SCORE_SENTINEL);
        assert_eq!(model.score("anything"), SCORE_SENTINEL);
    }

    #[test]
    fn test_dump_of_empty_model_fails() {
        let model = LangModel::new();
        let dir = tempfile::tempdir().unwrap();
        assert!(model.dump(dir.path().join("m.bin")).is_err());
    }

    #[test]
    fn test_load_of_garbage_clears_the_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.bin");
        std::fs::write(&path, b"not a model at all").unwrap();

        let mut model = LangModel::new();
        assert!(model.load(&path).is_err());
        assert_eq!(model.total_words(), 0);
        assert_eq!(model.vocab_len(), 0);
    }
}
