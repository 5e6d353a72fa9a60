//! 語彙ダンプサブコマンド
//!
//! モデルの語彙と頻度を2つのファイルに同じ順序で書き出します。

use std::io;
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use kosei::errors::KoseiError;
use kosei::LangModel;

/// 語彙ダンプコマンドの引数
#[derive(Parser, Debug)]
#[clap(name = "dump_vocab", about = "Dumps the vocabulary of a model")]
pub struct Args {
    /// Trained model file.
    model: PathBuf,

    /// A file to which the words are output.
    vocab_out: PathBuf,

    /// A file to which the frequencies are output.
    freq_out: PathBuf,
}

/// 語彙ダンプ処理中に発生する可能性のあるエラー
#[derive(Debug, Error)]
pub enum DumpVocabError {
    /// 入出力エラー
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// モデル操作エラー
    #[error("Failed to dump the vocabulary: {0}")]
    Kosei(#[from] KoseiError),
}

/// 語彙ダンプコマンドを実行する
///
/// # エラー
///
/// モデルの読み込みまたは出力ファイルの書き込みに失敗した場合、
/// `DumpVocabError`を返します。
pub fn run(args: Args) -> Result<(), DumpVocabError> {
    eprintln!("[info] loading the model");
    let mut model = LangModel::new();
    model.load(&args.model)?;
    eprintln!("[info] loaded, vocabulary size = {}", model.vocab_len());

    model.dump_vocab(&args.vocab_out, &args.freq_out)?;
    eprintln!("[info] done");
    Ok(())
}
