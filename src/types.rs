use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// mtop token 所在的 cookie 名稱
pub const TOKEN_COOKIE: &str = "_m_h5_tk";

/// token 與時間戳之間的分隔字元
pub const TOKEN_DELIMITER: char = '_';

/// 淘寶系 cookie 的網域
pub const TAOBAO_DOMAIN: &str = ".taobao.com";

/// 可以依名稱查詢 cookie 的來源
pub trait CookieSource {
    fn get(&self, name: &str) -> Option<&str>;
}

/// 從 `_m_h5_tk` 取出的簽名 token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// 第一個分隔字元之前的字串
    pub value: String,
    /// 第二段（毫秒時間戳），僅供診斷
    pub issued_at: Option<i64>,
}

impl Token {
    /// 解析 cookie 值，例如 `ABC123_1700000000000_xyz` -> `ABC123`
    pub fn parse(raw: &str) -> Result<Self> {
        let Some((value, rest)) = raw.split_once(TOKEN_DELIMITER) else {
            return Err(Error::MissingToken(format!(
                "{} 缺少分隔字元 '{}'",
                TOKEN_COOKIE, TOKEN_DELIMITER
            )));
        };

        if value.is_empty() {
            return Err(Error::MissingToken(format!("{} 的 token 為空", TOKEN_COOKIE)));
        }

        let issued_at = rest
            .split(TOKEN_DELIMITER)
            .next()
            .and_then(|s| s.parse::<i64>().ok());

        Ok(Self {
            value: value.to_string(),
            issued_at,
        })
    }
}

/// 某個網域下的 cookie 集合，建立後不再變動
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    domain: String,
    cookies: BTreeMap<String, String>,
}

impl Session {
    /// 建立 session，空值的 cookie 會被略過
    pub fn new<I, K, V>(domain: &str, cookies: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let cookies = cookies
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v)| !v.is_empty())
            .collect();

        Self {
            domain: domain.to_string(),
            cookies,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// `Cookie` header 的內容，依名稱排序
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl CookieSource for Session {
    fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }
}

/// 有序的請求參數
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParameters {
    pairs: Vec<(&'static str, String)>,
}

impl RequestParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &'static str, value: impl Into<String>) {
        self.pairs.push((key, value.into()));
    }

    pub fn to_query(&self) -> Vec<(String, String)> {
        self.pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
impl RequestParameters {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.pairs.iter().map(|(k, _)| *k).collect()
    }
}

/// 上傳後平台回傳的圖片 ID
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageIdentifier(String);

impl ImageIdentifier {
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() { None } else { Some(Self(id)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 搜尋請求的原始結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub url: String,
    pub status: u16,
    pub body: String,
}
