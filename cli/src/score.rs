//! 採点サブコマンド
//!
//! モデルを読み込み、標準入力の各行を1つの単語列として採点して
//! 対数確率を出力します。

use std::io::{self, BufRead};
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use kosei::errors::KoseiError;
use kosei::LangModel;

/// 採点コマンドの引数
#[derive(Parser, Debug)]
#[clap(name = "score", about = "Scores sentences from stdin")]
pub struct Args {
    /// Trained model file.
    model: PathBuf,
}

/// 採点処理中に発生する可能性のあるエラー
#[derive(Debug, Error)]
pub enum ScoreError {
    /// 入出力エラー
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// モデル読み込みエラー
    #[error("Failed to load the model: {0}")]
    Kosei(#[from] KoseiError),
}

/// 採点コマンドを実行する
///
/// # エラー
///
/// モデルの読み込みまたは標準入力の読み取りに失敗した場合、
/// `ScoreError`を返します。
pub fn run(args: Args) -> Result<(), ScoreError> {
    eprintln!("[info] loading the model");
    let mut model = LangModel::new();
    model.load(&args.model)?;
    eprintln!("[info] loaded");

    eprint!(">> ");
    for line in io::stdin().lock().lines() {
        let line = line?;
        println!("{}", model.score(&line));
        eprint!(">> ");
    }
    Ok(())
}
