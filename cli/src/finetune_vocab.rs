//! 語彙ファインチューニングサブコマンド
//!
//! 既存のモデルの語彙を追加コーパスと突き合わせ、現れなかった単語を
//! 取り除いた上でモデルを保存し直します。

use std::io;
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use kosei::errors::KoseiError;
use kosei::LangModel;

/// 語彙ファインチューニングコマンドの引数
#[derive(Parser, Debug)]
#[clap(name = "finetune_vocab", about = "Finetunes the vocabulary of a model")]
pub struct Args {
    /// Trained model file.
    model: PathBuf,

    /// Alphabet definition file.
    alphabet: PathBuf,

    /// Corpus whose words survive the finetuning.
    vocab_corpus: PathBuf,

    /// A file to which the finetuned model is output.
    out: PathBuf,
}

/// 語彙ファインチューニング処理中に発生する可能性のあるエラー
#[derive(Debug, Error)]
pub enum FinetuneVocabError {
    /// 入出力エラー
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// モデル操作エラー
    #[error("Failed to finetune the vocabulary: {0}")]
    Kosei(#[from] KoseiError),
}

/// 語彙ファインチューニングコマンドを実行する
///
/// # エラー
///
/// モデルの読み込み、コーパスの読み取り、モデルの書き出しに失敗した
/// 場合、`FinetuneVocabError`を返します。
pub fn run(args: Args) -> Result<(), FinetuneVocabError> {
    eprintln!("[info] loading the model");
    let mut model = LangModel::new();
    model.load(&args.model)?;
    eprintln!("[info] loaded, vocabulary size = {}", model.vocab_len());

    model.finetune_vocab(&args.vocab_corpus, &args.alphabet)?;
    eprintln!("[info] vocabulary size after finetune = {}", model.vocab_len());

    eprintln!("[info] writing the model to {}", args.out.display());
    model.dump(&args.out)?;
    eprintln!("[info] done");
    Ok(())
}
