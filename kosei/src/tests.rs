//! モデルのライフサイクル全体を通したシナリオテスト
//!
//! 小さなコーパスでの学習、枝刈り、保存と読み込み、語彙の
//! ファインチューニングまでの観測可能な振る舞いを検証します。

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use crate::model::vocabulary::UNKNOWN_WORD_ID;
use crate::model::{LangModel, SCORE_SENTINEL};

struct TrainEnv {
    _temp_dir: TempDir,
    corpus_path: PathBuf,
    alphabet_path: PathBuf,
    work_dir: PathBuf,
}

impl TrainEnv {
    fn new(corpus: &str) -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create a temporary directory");
        let work_dir = temp_dir.path().to_path_buf();
        let corpus_path = work_dir.join("corpus.txt");
        let alphabet_path = work_dir.join("alphabet.txt");
        fs::write(&corpus_path, corpus).unwrap();
        fs::write(&alphabet_path, "abcdefghijklmnopqrstuvwxyz").unwrap();
        Self {
            _temp_dir: temp_dir,
            corpus_path,
            alphabet_path,
            work_dir,
        }
    }

    fn train(&self, min_word_freq: u64) -> LangModel {
        let mut model = LangModel::new();
        model
            .train(&self.corpus_path, &self.alphabet_path, min_word_freq)
            .unwrap();
        model
    }
}

fn w(s: &str) -> Vec<char> {
    s.chars().collect()
}

/// 1文のコーパスで学習した後の要約値と頻度
#[test]
fn test_train_single_sentence_counts() {
    let env = TrainEnv::new("the cat sat on the mat");
    let model = env.train(1);

    assert_eq!(model.vocab_size(), 5);
    assert_eq!(model.total_words(), 6);

    let the = model.get_id_no_create(&w("the"));
    let cat = model.get_id_no_create(&w("cat"));
    let mat = model.get_id_no_create(&w("mat"));
    assert_eq!(model.gram1_count(the), 2);
    assert_eq!(model.gram1_count(cat), 1);
    assert_eq!(model.gram2_count(the, cat), 1);
    // 文末の隣接対も数えられる
    assert_eq!(model.gram2_count(the, mat), 1);
    // 未観測のバイグラム（逆順の隣接対）
    assert_eq!(model.gram2_count(mat, the), 0);
}

/// 観測された語順は逆順よりも高いスコアを得る
#[test]
fn test_observed_order_scores_higher() {
    let env = TrainEnv::new("the cat sat on the mat");
    let model = env.train(1);
    assert!(model.score("the cat") > model.score("cat the"));
}

/// 語彙との双方向対応はすべての既知語で一致し、未知語は番兵になる
#[test]
fn test_vocabulary_round_trip() {
    let env = TrainEnv::new("the cat sat on the mat");
    let model = env.train(1);

    for word in ["the", "cat", "sat", "on", "mat"] {
        let id = model.get_id_no_create(&w(word));
        assert_ne!(id, UNKNOWN_WORD_ID);
        assert_eq!(model.word(id), w(word).as_slice());
    }
    assert_eq!(model.get_id_no_create(&w("dog")), UNKNOWN_WORD_ID);
}

/// 学習で観測されたトライグラムの頻度照会は正の値を返す
#[test]
fn test_observed_trigrams_count_positive() {
    let env = TrainEnv::new("the cat sat on the mat");
    let model = env.train(1);

    let ids: Vec<u32> = ["the", "cat", "sat", "on", "the", "mat"]
        .iter()
        .map(|word| model.get_id_no_create(&w(word)))
        .collect();
    for triple in ids.windows(3) {
        assert!(model.gram3_count(triple[0], triple[1], triple[2]) > 0);
    }
}

/// 最低頻度2での枝刈り後は"the"だけが生き残る
#[test]
fn test_pruning_removes_low_frequency_words() {
    let env = TrainEnv::new("the cat sat on the mat");
    let model = env.train(2);

    assert_eq!(model.vocab_size(), 1);
    assert_ne!(model.get_id_no_create(&w("the")), UNKNOWN_WORD_ID);
    assert_eq!(model.get_id_no_create(&w("cat")), UNKNOWN_WORD_ID);
    // 枝刈りされた単語だけの入力は採点できない
    assert_eq!(model.score("cat"), SCORE_SENTINEL);
}

/// 空の入力は番兵スコアを返す
#[test]
fn test_empty_input_scores_sentinel() {
    let env = TrainEnv::new("the cat sat on the mat");
    let model = env.train(1);
    assert_eq!(model.score(""), SCORE_SENTINEL);
    assert_eq!(model.score_words(&[]), SCORE_SENTINEL);
}

/// 採点は決定的で、同じ入力に対してビット単位で同じ値を返す
#[test]
fn test_scoring_is_deterministic() {
    let env = TrainEnv::new("the cat sat on the mat");
    let model = env.train(1);
    for text in ["the cat", "the dog sat", "mat the on"] {
        assert_eq!(model.score(text).to_bits(), model.score(text).to_bits());
    }
}

/// 保存と読み込みは観測可能な振る舞いを変えない
#[test]
fn test_dump_then_load_is_identity() {
    let env = TrainEnv::new(
        "the cat sat on the mat. the dog sat on the rug. \
         a cat and a dog sat together",
    );
    let model = env.train(1);
    let model_path = env.work_dir.join("model.bin");
    model.dump(&model_path).unwrap();

    let mut loaded = LangModel::new();
    loaded.load(&model_path).unwrap();

    assert_eq!(loaded.get_checksum(), model.get_checksum());
    assert_eq!(loaded.total_words(), model.total_words());
    assert_eq!(loaded.vocab_size(), model.vocab_size());
    let texts = [
        "the cat sat",
        "the dog sat on the rug",
        "a cat and a dog",
        "rug the on dog",
        "unseen words only",
        "together",
        "the the the",
        "cat dog rug mat",
        "on on on",
        "a dog sat on the mat",
    ];
    for text in texts {
        assert_eq!(
            loaded.score(text).to_bits(),
            model.score(text).to_bits(),
            "score mismatch for {:?}",
            text,
        );
    }
}

/// 語彙のファインチューニングは残った単語のスコアを変えない
#[test]
fn test_finetune_drops_words_without_changing_scores() {
    let env = TrainEnv::new("the cat sat on the mat");
    let mut model = env.train(1);
    let before = model.score("the mat");

    let finetune_path = env.work_dir.join("finetune.txt");
    fs::write(&finetune_path, "the mat").unwrap();
    model
        .finetune_vocab(&finetune_path, &env.alphabet_path)
        .unwrap();

    assert_eq!(model.vocab_len(), 2);
    assert_eq!(model.get_id_no_create(&w("cat")), UNKNOWN_WORD_ID);
    assert_ne!(model.get_id_no_create(&w("the")), UNKNOWN_WORD_ID);
    assert_eq!(model.score("the mat").to_bits(), before.to_bits());
}

/// 語彙ダンプは単語と頻度を同じ順序で並べる
#[test]
fn test_dump_vocab_parallel_streams() {
    let env = TrainEnv::new("the cat sat on the mat");
    let model = env.train(1);
    let words_path = env.work_dir.join("vocab.txt");
    let freqs_path = env.work_dir.join("freq.txt");
    model.dump_vocab(&words_path, &freqs_path).unwrap();

    let words = fs::read_to_string(&words_path).unwrap();
    let freqs = fs::read_to_string(&freqs_path).unwrap();
    let words: Vec<&str> = words.split_terminator(',').collect();
    let freqs: Vec<&str> = freqs.split_terminator(',').collect();
    assert_eq!(words.len(), 5);
    assert_eq!(freqs.len(), 5);
    for (word, freq) in words.iter().zip(&freqs) {
        let expected = model.word_count(model.get_id_no_create(&w(word)));
        assert_eq!(freq.parse::<u32>().unwrap(), expected);
    }
    let the_index = words.iter().position(|&word| word == "the").unwrap();
    assert_eq!(freqs[the_index], "2");
}

/// 空のコーパスでの学習は失敗し、モデルの状態を変えない
#[test]
fn test_training_on_empty_corpus_fails() {
    let env = TrainEnv::new("the cat sat on the mat");
    let mut model = env.train(1);
    let checksum = model.get_checksum();

    let empty_path = env.work_dir.join("empty.txt");
    fs::write(&empty_path, "12345 !!!").unwrap();
    assert!(model
        .train(&empty_path, &env.alphabet_path, 1)
        .is_err());
    // 失敗した学習は以前の内容を壊さない
    assert_eq!(model.get_checksum(), checksum);
    assert_eq!(model.vocab_size(), 5);
}

/// 壊れたモデルファイルの読み込みはモデルを空に戻す
#[test]
fn test_load_of_truncated_file_clears_the_model() {
    let env = TrainEnv::new("the cat sat on the mat");
    let model = env.train(1);
    let model_path = env.work_dir.join("model.bin");
    model.dump(&model_path).unwrap();

    let bytes = fs::read(&model_path).unwrap();
    let truncated_path = env.work_dir.join("truncated.bin");
    fs::write(&truncated_path, &bytes[..bytes.len() - 4]).unwrap();

    let mut reloaded = LangModel::new();
    reloaded.load(&model_path).unwrap();
    assert!(reloaded.load(&truncated_path).is_err());
    assert_eq!(reloaded.vocab_len(), 0);
    assert_eq!(reloaded.score("the cat"), SCORE_SENTINEL);
}
