//! 語彙
//!
//! 単語と32ビット整数IDの双方向対応を管理します。IDは挿入順に0から
//! 密に割り当てられ、一度割り当てられたIDが別の単語を指すことはありません。
//! 枝刈りやファインチューニングで順方向（単語→ID）のエントリが消えても、
//! 逆方向（ID→単語）のスロットは残ります。

use std::collections::HashMap;

use crate::errors::{KoseiError, Result};

/// 未知語を表す番兵ID。[`Vocabulary::get_or_create_id`]が生成することは
/// ありません。
pub const UNKNOWN_WORD_ID: u32 = u32::MAX;

/// 単語とIDの双方向対応。
///
/// 逆方向のテーブルはIDで直接添字付けできる連続したベクターです。
#[derive(Debug, Default, Clone)]
pub struct Vocabulary {
    word_to_id: HashMap<Vec<char>, u32>,
    id_to_word: Vec<Vec<char>>,
    last_word_id: u32,
}

impl Vocabulary {
    /// 空の語彙を生成します。
    pub fn new() -> Self {
        Self::default()
    }

    /// 単語のIDを返します。未登録の場合は新しいIDを割り当てます。
    ///
    /// 同じ内容の単語に対しては常に同じIDを返します。
    pub fn get_or_create_id(&mut self, word: &[char]) -> u32 {
        if let Some(&id) = self.word_to_id.get(word) {
            return id;
        }
        let id = self.last_word_id;
        self.last_word_id += 1;
        self.word_to_id.insert(word.to_vec(), id);
        self.id_to_word.push(word.to_vec());
        id
    }

    /// 単語のIDを返します。未登録の場合は[`UNKNOWN_WORD_ID`]を返します。
    #[inline(always)]
    pub fn get_id_no_create(&self, word: &[char]) -> u32 {
        self.word_to_id
            .get(word)
            .copied()
            .unwrap_or(UNKNOWN_WORD_ID)
    }

    /// IDから単語を引きます。範囲外のIDには空のスパンを返します。
    #[inline(always)]
    pub fn word(&self, id: u32) -> &[char] {
        self.id_to_word
            .get(id as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 述語を満たさないIDの順方向エントリを取り除きます。
    ///
    /// 逆方向のテーブルは圧縮されず、残った単語のIDは有効なままです。
    pub fn prune<F>(&mut self, keep: F)
    where
        F: Fn(u32) -> bool,
    {
        self.word_to_id.retain(|_, id| keep(*id));
    }

    /// 述語を満たさない単語の順方向エントリを取り除きます。
    ///
    /// [`prune`](Self::prune)のID版と同じく、逆方向のテーブルには触れません。
    pub fn retain_words<F>(&mut self, keep: F)
    where
        F: Fn(&[char]) -> bool,
    {
        self.word_to_id.retain(|word, _| keep(word));
    }

    /// 順方向エントリの個数を返します。
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.word_to_id.len()
    }

    /// 語彙が空かどうかを返します。
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.word_to_id.is_empty()
    }

    /// これまでに割り当てたIDの個数を返します。
    #[inline(always)]
    pub fn last_word_id(&self) -> u32 {
        self.last_word_id
    }

    /// 順方向エントリのイテレータを返します。順序は不定です。
    pub fn iter(&self) -> impl Iterator<Item = (&[char], u32)> {
        self.word_to_id.iter().map(|(w, &id)| (w.as_slice(), id))
    }

    /// 内部状態をクリアします。
    pub fn clear(&mut self) {
        self.word_to_id.clear();
        self.id_to_word.clear();
        self.last_word_id = 0;
    }

    /// シリアライズ用に順方向マップへの参照を返します。
    pub(crate) fn word_map(&self) -> &HashMap<Vec<char>, u32> {
        &self.word_to_id
    }

    /// デシリアライズされた順方向マップから語彙を再構築します。
    ///
    /// 逆方向のテーブルは`last_word_id`個のスロットを持ち、枝刈り済みの
    /// IDのスロットは空のままになります。
    ///
    /// # エラー
    ///
    /// マップが`last_word_id`以上のIDを含む場合にエラーを返します。
    pub(crate) fn from_parts(
        word_to_id: HashMap<Vec<char>, u32>,
        last_word_id: u32,
    ) -> Result<Self> {
        let mut id_to_word = vec![Vec::new(); last_word_id as usize];
        for (word, &id) in &word_to_id {
            let slot = id_to_word.get_mut(id as usize).ok_or_else(|| {
                KoseiError::invalid_format("word_to_id", "a word id is out of range.")
            })?;
            *slot = word.clone();
        }
        Ok(Self {
            word_to_id,
            id_to_word,
            last_word_id,
        })
    }
}
