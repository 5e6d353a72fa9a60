//! スペル訂正器
//!
//! 言語モデルの上に載る訂正探索のレイヤです。各単語について編集距離2以内の
//! 語彙内候補を生成し、文全体の対数確率が最も高くなる候補を選びます。
//! 既知語の置き換えには一定のマージンを要求し、綴りが正しい単語を
//! むやみに書き換えないようにします。

use std::collections::HashSet;
use std::path::Path;

use crate::errors::Result;
use crate::model::vocabulary::UNKNOWN_WORD_ID;
use crate::model::LangModel;
use crate::tokenizer::lowercase;

/// 既知語を置き換えるために候補が上回るべき対数確率のマージン。
const KNOWN_WORD_MARGIN: f64 = 3.0;

/// 言語モデルに基づくスペル訂正器。
pub struct SpellCorrector {
    model: LangModel,
}

impl SpellCorrector {
    /// 学習済みモデルから訂正器を生成します。
    pub fn new(model: LangModel) -> Self {
        Self { model }
    }

    /// モデルファイルを読み込んで訂正器を生成します。
    ///
    /// # エラー
    ///
    /// モデルの読み込みに失敗した場合にエラーを返します。
    pub fn load_lang_model<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let mut model = LangModel::new();
        model.load(path)?;
        Ok(Self { model })
    }

    /// 内部の言語モデルへの参照を返します。
    #[inline(always)]
    pub fn model(&self) -> &LangModel {
        &self.model
    }

    /// 単語の訂正候補を生成します。
    ///
    /// 編集距離1および2の変形（削除・隣接転置・置換・挿入）のうち、
    /// 語彙に含まれるものだけを返します。置換と挿入はモデルの
    /// アルファベットの文字に限られます。元の単語自身は含まれません。
    ///
    /// # 戻り値
    ///
    /// 重複のない候補のベクター。順序は決定的です。
    pub fn candidates(&self, word: &[char]) -> Vec<Vec<char>> {
        let mut letters: Vec<char> = self.model.tokenizer().alphabet().iter().copied().collect();
        letters.sort_unstable();

        let mut edits1 = Vec::new();
        push_edits(word, &letters, &mut edits1);

        let mut seen: HashSet<Vec<char>> = HashSet::new();
        let mut found = Vec::new();
        let mut consider = |candidate: &[char], found: &mut Vec<Vec<char>>| {
            if candidate != word
                && self.model.get_id_no_create(candidate) != UNKNOWN_WORD_ID
                && seen.insert(candidate.to_vec())
            {
                found.push(candidate.to_vec());
            }
        };

        for edit in &edits1 {
            consider(edit, &mut found);
        }
        let mut edits2 = Vec::new();
        for edit in &edits1 {
            edits2.clear();
            push_edits(edit, &letters, &mut edits2);
            for edit in &edits2 {
                consider(edit, &mut found);
            }
        }
        found
    }

    /// 1文ぶんの単語列を訂正します。
    ///
    /// 左から右へ1単語ずつ、候補で置き換えた文のスコアを比較します。
    /// 未知語はより良い候補があれば常に置き換えられ、既知語は候補が
    /// 一定のマージンを超えて上回る場合のみ置き換えられます。
    pub fn fix_sentence(&self, words: &[&[char]]) -> Vec<Vec<char>> {
        let mut fixed: Vec<Vec<char>> = words.iter().map(|w| w.to_vec()).collect();
        for i in 0..fixed.len() {
            let original = fixed[i].clone();
            let candidates = self.candidates(&original);
            if candidates.is_empty() {
                continue;
            }
            let known = self.model.get_id_no_create(&original) != UNKNOWN_WORD_ID;
            let base = self.score_with(&fixed, i, &original);

            let mut best: Option<Vec<char>> = None;
            let mut best_score = f64::MIN;
            for candidate in candidates {
                let score = self.score_with(&fixed, i, &candidate);
                if score > best_score {
                    best_score = score;
                    best = Some(candidate);
                }
            }
            let margin = if known { KNOWN_WORD_MARGIN } else { 0.0 };
            if let Some(best) = best {
                if best_score > base + margin {
                    fixed[i] = best;
                }
            }
        }
        fixed
    }

    /// テキスト断片を訂正します。
    ///
    /// テキストを小文字化してトークナイズし、各文を訂正した上で、
    /// 単語以外の文字（空白や句読点）を保ったまま組み立て直します。
    /// 出力は小文字になります。
    pub fn fix_fragment(&self, text: &str) -> String {
        let chars = lowercase(text);
        let sentences = self.model.tokenizer().process(&chars);

        // スパンは`chars`への参照なので、アドレス差から位置を復元できる
        let base = chars.as_ptr() as usize;
        let mut out = String::with_capacity(chars.len());
        let mut pos = 0usize;
        for sentence in &sentences {
            let fixed = self.fix_sentence(sentence);
            for (word, replacement) in sentence.iter().zip(&fixed) {
                let start = (word.as_ptr() as usize - base) / std::mem::size_of::<char>();
                out.extend(chars[pos..start].iter());
                out.extend(replacement.iter());
                pos = start + word.len();
            }
        }
        out.extend(chars[pos..].iter());
        out
    }

    fn score_with(&self, words: &[Vec<char>], index: usize, replacement: &[char]) -> f64 {
        let view: Vec<&[char]> = words
            .iter()
            .enumerate()
            .map(|(i, word)| {
                if i == index {
                    replacement
                } else {
                    word.as_slice()
                }
            })
            .collect();
        self.model.score_words(&view)
    }
}

/// 単語の編集距離1の変形をすべて`out`に追加します。
fn push_edits(word: &[char], letters: &[char], out: &mut Vec<Vec<char>>) {
    // 削除
    for i in 0..word.len() {
        let mut edit = Vec::with_capacity(word.len() - 1);
        edit.extend_from_slice(&word[..i]);
        edit.extend_from_slice(&word[i + 1..]);
        out.push(edit);
    }
    // 隣接転置
    for i in 0..word.len().saturating_sub(1) {
        let mut edit = word.to_vec();
        edit.swap(i, i + 1);
        out.push(edit);
    }
    // 置換
    for i in 0..word.len() {
        for &c in letters {
            if c != word[i] {
                let mut edit = word.to_vec();
                edit[i] = c;
                out.push(edit);
            }
        }
    }
    // 挿入
    for i in 0..=word.len() {
        for &c in letters {
            let mut edit = Vec::with_capacity(word.len() + 1);
            edit.extend_from_slice(&word[..i]);
            edit.push(c);
            edit.extend_from_slice(&word[i..]);
            out.push(edit);
        }
    }
}
