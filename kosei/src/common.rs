//! モデルファイルの共通設定
//!
//! このモジュールは、モデルファイルのシリアライゼーションに使用される
//! 共通のbincode設定と、ファイル枠組みの定数を提供します。

use bincode::config::{self, Fixint, LittleEndian};

/// kosei言語モデルファイルを識別するマジックナンバー。
///
/// リトルエンディアンで書き出すとファイル先頭が`KOSEILM1`のASCIIバイト列に
/// なります。同じ値がファイル末尾にも書き込まれ、切り詰められたファイルの
/// 検出に使用されます。
pub const MODEL_MAGIC: u64 = 0x314d_4c49_4553_4f4b;

/// モデルファイルフォーマットのバージョン番号。
///
/// このバージョンはクレートのセマンティックバージョンからは切り離されており、
/// ファイルフォーマットに互換性のない変更が入った場合のみ増加します。
pub const MODEL_VERSION: u16 = 1;

/// 完全ハッシュブロックのバージョン番号。
///
/// 完全ハッシュの状態はモデルファイル内で独立したバージョン付きブロックとして
/// 保存されます。ハッシュ実装を差し替える場合はこの番号を増加させます。
pub const PERFECT_HASH_VERSION: u16 = 1;

/// シリアライゼーションの共通bincode設定を取得します。
///
/// リトルエンディアンと固定長整数エンコーディングを使用するため、
/// 整数フィールドは固定幅、コンテナの長さプレフィックスは64ビット、
/// `char`は32ビットのコードユニットとしてエンコードされます。
pub const fn bincode_config() -> config::Configuration<LittleEndian, Fixint> {
    config::standard()
        .with_little_endian()
        .with_fixed_int_encoding()
}
