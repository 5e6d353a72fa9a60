//! アルファベット駆動のトークナイザ
//!
//! このモジュールは、学習コーパスと採点対象のテキストを文と単語スパンの列に
//! 分割するトークナイザを提供します。単語はアルファベット集合に含まれる文字の
//! 最長連続列として切り出され、`.` `!` `?` `;` が文の区切りになります。
//! アルファベットの状態はモデルファイルの先頭に一緒にシリアライズされます。

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use bincode::{Decode, Encode};

use crate::errors::{KoseiError, Result};

/// 文の区切りとして扱う文字。
const SENTENCE_TERMINATORS: [char; 4] = ['.', '!', '?', ';'];

/// テキストを文単位の単語スパン列に分割するトークナイザ。
///
/// アルファベット集合に含まれない文字はすべて単語の区切りとして扱われます。
/// 返されるスパンは入力の文字バッファへの参照であり、コピーを持ちません。
#[derive(Debug, Default, Clone, Decode, Encode)]
pub struct Tokenizer {
    alphabet: HashSet<char>,
}

impl Tokenizer {
    /// 空のアルファベットを持つトークナイザを生成します。
    pub fn new() -> Self {
        Self::default()
    }

    /// アルファベット定義ファイルを読み込みます。
    ///
    /// ファイルに含まれる空白以外のすべての文字（小文字化したもの）が
    /// アルファベットになります。読み込みに成功した場合のみ既存の
    /// アルファベットが置き換えられます。
    ///
    /// # 引数
    ///
    /// * `path` - アルファベット定義ファイルへのパス
    ///
    /// # エラー
    ///
    /// ファイルを開けない場合、またはファイルが1文字も含まない場合に
    /// エラーを返します。
    pub fn load_alphabet<P>(&mut self, path: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let text = fs::read_to_string(path)?;
        let alphabet: HashSet<char> = text
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();
        if alphabet.is_empty() {
            return Err(KoseiError::invalid_argument(
                "path",
                "the alphabet file contains no characters.",
            ));
        }
        self.alphabet = alphabet;
        Ok(())
    }

    /// アルファベット集合への参照を取得します。
    #[inline(always)]
    pub fn alphabet(&self) -> &HashSet<char> {
        &self.alphabet
    }

    /// アルファベットが空かどうかを返します。
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.alphabet.is_empty()
    }

    /// テキストを文ごとの単語スパン列に分割します。
    ///
    /// 各スパンは`text`への参照です。単語を1つも含まない文は生成されません。
    /// 文の区切り文字が現れなかった場合、末尾までの単語列が1つの文になります。
    ///
    /// # 引数
    ///
    /// * `text` - 小文字化済みの文字バッファ（[`lowercase`]を参照）
    ///
    /// # 戻り値
    ///
    /// 文のベクター。各文は単語スパンのベクターです。
    pub fn process<'a>(&self, text: &'a [char]) -> Vec<Vec<&'a [char]>> {
        let mut sentences = Vec::new();
        let mut words: Vec<&'a [char]> = Vec::new();
        let mut word_start: Option<usize> = None;
        for (i, &c) in text.iter().enumerate() {
            if self.alphabet.contains(&c) {
                if word_start.is_none() {
                    word_start = Some(i);
                }
                continue;
            }
            if let Some(start) = word_start.take() {
                words.push(&text[start..i]);
            }
            if SENTENCE_TERMINATORS.contains(&c) && !words.is_empty() {
                sentences.push(std::mem::take(&mut words));
            }
        }
        if let Some(start) = word_start {
            words.push(&text[start..]);
        }
        if !words.is_empty() {
            sentences.push(words);
        }
        sentences
    }

    /// 内部状態をクリアします。
    pub fn clear(&mut self) {
        self.alphabet.clear();
    }
}

/// テキストを小文字化した文字バッファに変換します。
///
/// 大文字1文字が複数の小文字に展開される言語にも対応するため、
/// 変換後の長さは入力と異なる場合があります。
pub fn lowercase(text: &str) -> Vec<char> {
    text.chars().flat_map(char::to_lowercase).collect()
}
