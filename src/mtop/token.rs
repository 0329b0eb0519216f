use super::{APP_KEY, h5_url, now_millis};
use crate::error::{Error, Result};
use crate::transport::{HttpRequest, HttpTransport};
use crate::types::{CookieSource, Session, TAOBAO_DOMAIN, TOKEN_COOKIE, Token};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// 提供簽名所需的 token 與 session
pub trait TokenSource {
    fn current_token(&self) -> &Token;
    fn current_session(&self) -> &Session;
}

/// 已解析完成的 session + token
#[derive(Debug, Clone)]
pub struct Credentials {
    session: Session,
    token: Token,
}

impl Credentials {
    /// session 必須含有 `_m_h5_tk`
    pub fn from_session(session: Session) -> Result<Self> {
        let raw = session
            .get(TOKEN_COOKIE)
            .ok_or_else(|| Error::MissingToken(format!("session 中沒有 {}", TOKEN_COOKIE)))?;
        let token = Token::parse(raw)?;

        Ok(Self { session, token })
    }
}

impl TokenSource for Credentials {
    fn current_token(&self) -> &Token {
        &self.token
    }

    fn current_session(&self) -> &Session {
        &self.session
    }
}

/// 取得 session 的策略
#[async_trait::async_trait]
pub trait SessionStrategy: Send + Sync {
    /// 策略名稱
    fn name(&self) -> &str;

    async fn resolve(&self) -> Result<Credentials>;
}

/// 直接使用外部提供的 `_m_h5_tk` 值
pub struct ExternalTokenStrategy {
    raw: String,
}

impl ExternalTokenStrategy {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}

#[async_trait::async_trait]
impl SessionStrategy for ExternalTokenStrategy {
    fn name(&self) -> &str {
        "token"
    }

    async fn resolve(&self) -> Result<Credentials> {
        // 先驗證，空字串不會進 session
        Token::parse(&self.raw)?;
        let session = Session::new(TAOBAO_DOMAIN, [(TOKEN_COOKIE, self.raw.as_str())]);
        Credentials::from_session(session)
    }
}

/// 從 cookie JSON 檔載入所有 cookie
pub struct CookieFileStrategy {
    path: PathBuf,
}

impl CookieFileStrategy {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 讀取 `{"name": "value", ...}`
    pub fn load(&self) -> Result<BTreeMap<String, String>> {
        let content = fs::read_to_string(&self.path).map_err(|source| Error::FileAccess {
            path: self.path.clone(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|e| Error::InvalidCookieFile {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl SessionStrategy for CookieFileStrategy {
    fn name(&self) -> &str {
        "cookie-file"
    }

    async fn resolve(&self) -> Result<Credentials> {
        let cookies = self.load()?;
        let session = Session::new(TAOBAO_DOMAIN, cookies);
        info!(path = %self.path.display(), cookies = session.len(), "已載入 cookie 檔");
        Credentials::from_session(session)
    }
}

/// 向 token endpoint 發出匿名請求，取得伺服器發的 cookie
pub struct FetchedSessionStrategy {
    transport: Arc<dyn HttpTransport>,
    api: String,
    headers: Vec<(String, String)>,
}

impl FetchedSessionStrategy {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        api: impl Into<String>,
        headers: Vec<(String, String)>,
    ) -> Self {
        Self {
            transport,
            api: api.into(),
            headers,
        }
    }

    pub fn token_url(&self) -> String {
        h5_url(&self.api, "1.0")
    }

    /// token endpoint 的參數（不需簽名）
    pub fn token_params(&self, timestamp: i64) -> Vec<(String, String)> {
        [
            ("jsv", "2.7.0".to_string()),
            ("appKey", APP_KEY.to_string()),
            ("t", timestamp.to_string()),
            ("api", self.api.clone()),
            ("v", "1.0".to_string()),
            ("type", "json".to_string()),
            ("dataType", "jsonp".to_string()),
            ("callback", "mtopjsonp1".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

#[async_trait::async_trait]
impl SessionStrategy for FetchedSessionStrategy {
    fn name(&self) -> &str {
        "fetched-session"
    }

    async fn resolve(&self) -> Result<Credentials> {
        let request = HttpRequest::get(self.token_url())
            .with_query(self.token_params(now_millis()))
            .with_headers(self.headers.clone());

        let response = self.transport.send(request).await?;
        debug!(status = response.status, cookies = response.cookies.len(), "token endpoint 回應");

        let session = Session::new(TAOBAO_DOMAIN, response.cookies);
        Credentials::from_session(session)
    }
}
