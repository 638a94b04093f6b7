use std::collections::HashMap;
use std::ops::Index;

/// ヘッダー名から値へのマップ
///
/// 名前は大文字小文字を区別する。同じ名前を再度挿入すると値を上書きする (後勝ち)。
/// 反復順は最初に挿入された順だが、意味を持たない。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
    /// 名前 → `entries` の位置
    index: HashMap<String, usize>,
}

impl HeaderMap {
    /// 空のマップを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// ヘッダーを挿入し、上書きされた値を返す
    pub fn insert(&mut self, name: &str, value: &str) -> Option<String> {
        if let Some(&i) = self.index.get(name) {
            return Some(std::mem::replace(&mut self.entries[i].1, value.to_string()));
        }
        self.index.insert(name.to_string(), self.entries.len());
        self.entries.push((name.to_string(), value.to_string()));
        None
    }

    /// ヘッダーを取得 (大文字小文字を区別する)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.index.get(name).map(|&i| self.entries[i].1.as_str())
    }

    /// ヘッダーを取得 (大文字小文字を区別しない)
    ///
    /// 大文字小文字違いの名前が複数ある場合は最初に挿入されたものを返す。
    /// ヘッダー数に比例する線形探索。
    pub fn get_ignore_case(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// ヘッダーが存在するか確認
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// ヘッダー数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// ヘッダーが空か確認
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (名前, 値) を列挙
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<'a> Index<&'a str> for HeaderMap {
    type Output = str;

    /// 存在しない名前を指定すると panic する
    fn index(&self, name: &'a str) -> &str {
        match self.get(name) {
            Some(v) => v,
            None => panic!("header not found: {}", name),
        }
    }
}

impl<'a> IntoIterator for &'a HeaderMap {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
