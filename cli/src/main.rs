//! kosei コマンドラインツールのメインエントリーポイント
//!
//! このモジュールは、言語モデルの学習・採点・スペル訂正・語彙操作の
//! ための各サブコマンドを統合したCLIツールを提供します。
//! 使い方の誤りを含むあらゆる失敗は終了コード42で報告されます。

mod correct;
mod dump_vocab;
mod finetune_vocab;
mod fix;
mod score;
mod train;

use clap::Parser;
use thiserror::Error;

use crate::correct::CorrectError;
use crate::dump_vocab::DumpVocabError;
use crate::finetune_vocab::FinetuneVocabError;
use crate::fix::FixError;
use crate::score::ScoreError;
use crate::train::TrainError;

/// 失敗時の終了コード。
const FAILURE_EXIT_CODE: i32 = 42;

/// コマンドライン引数の構造体
///
/// `clap`を使用してコマンドライン引数をパースします。
#[derive(Parser, Debug)]
#[clap(name = "kosei", version)]
struct Cli {
    /// 実行するサブコマンド
    #[clap(subcommand)]
    command: Command,
}

/// 利用可能なサブコマンド
#[derive(Parser, Debug)]
enum Command {
    /// コーパスから言語モデルを学習します
    Train(train::Args),

    /// モデルを読み込み、標準入力の各行のスコアを出力します
    Score(score::Args),

    /// モデルを読み込み、標準入力の各行を訂正して出力します
    Correct(correct::Args),

    /// テキストファイルを訂正して別のファイルに書き出します
    Fix(fix::Args),

    /// モデルの語彙と頻度を2つのファイルに書き出します
    #[clap(name = "dump_vocab")]
    DumpVocab(dump_vocab::Args),

    /// 追加コーパスで語彙をファインチューニングし、モデルを保存し直します
    #[clap(name = "finetune_vocab")]
    FinetuneVocab(finetune_vocab::Args),
}

/// 実行中に発生する可能性のあるエラー
///
/// 各サブコマンドで発生したエラーをラップします。
#[derive(Debug, Error)]
pub enum CliError {
    /// モデル学習中のエラー
    #[error(transparent)]
    Train(#[from] TrainError),
    /// 採点中のエラー
    #[error(transparent)]
    Score(#[from] ScoreError),
    /// 訂正中のエラー
    #[error(transparent)]
    Correct(#[from] CorrectError),
    /// ファイル訂正中のエラー
    #[error(transparent)]
    Fix(#[from] FixError),
    /// 語彙ダンプ中のエラー
    #[error(transparent)]
    DumpVocab(#[from] DumpVocabError),
    /// 語彙ファインチューニング中のエラー
    #[error(transparent)]
    FinetuneVocab(#[from] FinetuneVocabError),
}

/// メイン関数
///
/// コマンドライン引数をパースし、指定されたサブコマンドを実行します。
/// 失敗した場合はエラーを表示して終了コード42で終了します。
fn main() {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = match e.kind() {
                clap::ErrorKind::DisplayHelp | clap::ErrorKind::DisplayVersion => 0,
                _ => FAILURE_EXIT_CODE,
            };
            std::process::exit(code);
        }
    };

    let result: Result<(), CliError> = match cli.command {
        Command::Train(args) => train::run(args).map_err(Into::into),
        Command::Score(args) => score::run(args).map_err(Into::into),
        Command::Correct(args) => correct::run(args).map_err(Into::into),
        Command::Fix(args) => fix::run(args).map_err(Into::into),
        Command::DumpVocab(args) => dump_vocab::run(args).map_err(Into::into),
        Command::FinetuneVocab(args) => finetune_vocab::run(args).map_err(Into::into),
    };

    if let Err(e) = result {
        eprintln!("[error] {}", e);
        std::process::exit(FAILURE_EXIT_CODE);
    }
}
