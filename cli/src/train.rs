//! モデル学習サブコマンド
//!
//! コーパスとアルファベット定義からトライグラム言語モデルを学習し、
//! バイナリモデルファイルとして保存します。

use std::io;
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use kosei::errors::KoseiError;
use kosei::LangModel;

/// 学習コマンドの引数
#[derive(Parser, Debug)]
#[clap(name = "train", about = "Trains a language model")]
pub struct Args {
    /// Alphabet definition file.
    alphabet: PathBuf,

    /// Training corpus (plain text).
    dataset: PathBuf,

    /// A file to which the trained model is output.
    out: PathBuf,

    /// Minimum frequency of words and n-grams to keep.
    #[clap(default_value_t = 0)]
    min_word_freq: u64,
}

/// 学習処理中に発生する可能性のあるエラー
#[derive(Debug, Error)]
pub enum TrainError {
    /// 入出力エラー
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// 学習処理エラー
    #[error("Training failed: {0}")]
    Kosei(#[from] KoseiError),
}

/// 学習コマンドを実行する
///
/// # 引数
///
/// * `args` - 学習コマンドの引数
///
/// # エラー
///
/// コーパスやアルファベットの読み込み、学習処理、モデルの書き出しに
/// 失敗した場合、`TrainError`を返します。
pub fn run(args: Args) -> Result<(), TrainError> {
    eprintln!("[info] training the model");
    let mut model = LangModel::new();
    model.train(&args.dataset, &args.alphabet, args.min_word_freq)?;

    eprintln!("[info] writing the model to {}", args.out.display());
    model.dump(&args.out)?;

    eprintln!("[info] done");
    Ok(())
}
