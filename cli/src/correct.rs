//! 対話的な訂正サブコマンド
//!
//! モデルを読み込み、標準入力の各行を訂正して出力します。

use std::io::{self, BufRead};
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use kosei::errors::KoseiError;
use kosei::SpellCorrector;

/// 訂正コマンドの引数
#[derive(Parser, Debug)]
#[clap(name = "correct", about = "Corrects sentences from stdin")]
pub struct Args {
    /// Trained model file.
    model: PathBuf,
}

/// 訂正処理中に発生する可能性のあるエラー
#[derive(Debug, Error)]
pub enum CorrectError {
    /// 入出力エラー
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// モデル読み込みエラー
    #[error("Failed to load the model: {0}")]
    Kosei(#[from] KoseiError),
}

/// 訂正コマンドを実行する
///
/// # エラー
///
/// モデルの読み込みまたは標準入力の読み取りに失敗した場合、
/// `CorrectError`を返します。
pub fn run(args: Args) -> Result<(), CorrectError> {
    eprintln!("[info] loading the model");
    let corrector = SpellCorrector::load_lang_model(&args.model)?;
    eprintln!("[info] loaded");

    eprint!(">> ");
    for line in io::stdin().lock().lines() {
        let line = line?;
        println!("{}", corrector.fix_fragment(&line));
        eprint!(">> ");
    }
    Ok(())
}
