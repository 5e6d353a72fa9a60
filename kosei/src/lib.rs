//! # kosei
//!
//! koseiは、統計的スペル訂正のためのコンパクトなトライグラム言語モデルです。
//!
//! ## 概要
//!
//! このライブラリは、大規模な語彙とNグラム集合を読み取り専用の小さな
//! バイナリファイルに収め、候補ランキングのホットパスで文の対数確率を
//! 高速に計算するための言語モデルを提供します。
//!
//! ## 主な機能
//!
//! - **コンパクトな格納**: 観測された全1・2・3グラムに対する最小完全
//!   ハッシュにより、Nグラム1つあたり4バイト（16ビットの
//!   フィンガープリントと16ビットの非可逆圧縮済み頻度）で格納します
//! - **平滑化された採点**: 加算平滑化されたトライグラム補間により、
//!   未観測のNグラムにも滑らかに劣化する対数確率を返します
//! - **高速な読み込み**: 固定フォーマットのバイナリモデルファイルからの
//!   逐次読み込み
//! - **スペル訂正**: 言語モデルに基づく候補生成と文脈を考慮した訂正
//!
//! ## 使用例
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use kosei::LangModel;
//!
//! let mut model = LangModel::new();
//! model.train("corpus.txt", "alphabet.txt", 1)?;
//! model.dump("model.bin")?;
//!
//! let mut loaded = LangModel::new();
//! loaded.load("model.bin")?;
//! assert!(loaded.score("the cat sat") > loaded.score("sat the cat"));
//! # Ok(())
//! # }
//! ```

/// 共通のシリアライゼーション設定と定数
pub mod common;

/// スペル訂正器
pub mod corrector;

/// エラー型の定義
pub mod errors;

/// トライグラム言語モデル
pub mod model;

/// アルファベット駆動のトークナイザ
pub mod tokenizer;

#[cfg(test)]
mod tests;

// Re-exports
pub use corrector::SpellCorrector;
pub use model::vocabulary::UNKNOWN_WORD_ID;
pub use model::{LangModel, SCORE_SENTINEL};
pub use tokenizer::Tokenizer;

/// このライブラリのバージョン番号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
