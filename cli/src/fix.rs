//! ファイル訂正サブコマンド
//!
//! テキストファイル全体を訂正し、結果を別のファイルに書き出します。

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use thiserror::Error;

use kosei::errors::KoseiError;
use kosei::SpellCorrector;

/// ファイル訂正コマンドの引数
#[derive(Parser, Debug)]
#[clap(name = "fix", about = "Fixes a text file")]
pub struct Args {
    /// Trained model file.
    model: PathBuf,

    /// Input text file.
    input: PathBuf,

    /// A file to which the fixed text is output.
    output: PathBuf,
}

/// ファイル訂正処理中に発生する可能性のあるエラー
#[derive(Debug, Error)]
pub enum FixError {
    /// 入出力エラー
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// モデル読み込みエラー
    #[error("Failed to load the model: {0}")]
    Kosei(#[from] KoseiError),
}

/// ファイル訂正コマンドを実行する
///
/// # エラー
///
/// モデルの読み込み、入力ファイルの読み取り、出力ファイルの書き込みに
/// 失敗した場合、`FixError`を返します。
pub fn run(args: Args) -> Result<(), FixError> {
    eprintln!("[info] loading the model");
    let corrector = SpellCorrector::load_lang_model(&args.model)?;
    eprintln!("[info] loaded");

    let text = fs::read_to_string(&args.input)?;
    let start = Instant::now();
    let fixed = corrector.fix_fragment(&text);
    let elapsed = start.elapsed();
    fs::write(&args.output, fixed)?;

    eprintln!("[info] process time: {} ms", elapsed.as_millis());
    Ok(())
}
