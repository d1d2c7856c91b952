use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// TokenFrequency 構造体
/// 1ドキュメント内の token の出現回数を管理します
/// 挿入順 (最初に出現した順) を保持するので、集計の順序は入力に対して決定的です
///
/// # Examples
/// ```
/// use w2v_doc_vectorizer::TokenFrequency;
/// let mut freq = TokenFrequency::new();
/// freq.add_token("gene").add_token("cell").add_token("gene");
/// assert_eq!(freq.token_count("gene"), 2);
/// assert_eq!(freq.token_num(), 2);
/// assert_eq!(freq.token_sum(), 3);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TokenFrequency {
    #[serde(with = "indexmap::map::serde_seq")]
    token_count: IndexMap<String, u32>,
    total_token_count: u64,
}

impl TokenFrequency {
    /// 新しいTokenFrequencyを作成するメソッド
    pub fn new() -> Self {
        TokenFrequency {
            token_count: IndexMap::new(),
            total_token_count: 0,
        }
    }

    /// 空白区切りで text を数えます
    /// `keep` が false を返す token は無視されます
    ///
    /// # Arguments
    /// * `text` - ドキュメント本文
    /// * `keep` - token を残すかどうかの判定
    pub fn from_text<F>(text: &str, keep: F) -> Self
    where
        F: Fn(&str) -> bool,
    {
        let mut freq = Self::new();
        for token in text.split_whitespace().filter(|t| keep(t)) {
            freq.add_token(token);
        }
        freq
    }

    /// tokenを追加する
    #[inline]
    pub fn add_token(&mut self, token: &str) -> &mut Self {
        let count = self.token_count.entry(token.to_string()).or_insert(0);
        *count += 1;
        self.total_token_count += 1;
        self
    }

    /// あるtokenの出現回数 (未出現なら 0)
    #[inline]
    pub fn token_count(&self, token: &str) -> u32 {
        *self.token_count.get(token).unwrap_or(&0)
    }

    /// 全tokenのカウントの合計
    #[inline]
    pub fn token_sum(&self) -> u64 {
        self.total_token_count
    }

    /// 出現したユニークな token の数
    #[inline]
    pub fn token_num(&self) -> usize {
        self.token_count.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.token_count.is_empty()
    }

    #[inline]
    pub fn contains_token(&self, token: &str) -> bool {
        self.token_count.contains_key(token)
    }

    /// (token, 出現回数) を出現順に返します
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.token_count.iter().map(|(t, &c)| (t.as_str(), c))
    }
}
