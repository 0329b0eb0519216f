use crate::config::ClientConfig;
use crate::error::{Error, Result};
use reqwest::Client;
use reqwest::header::COOKIE;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// 一次 HTTP 請求（與實作無關）
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    /// `application/x-www-form-urlencoded` 的 body 欄位
    pub form: Vec<(String, String)>,
    pub cookie: Option<String>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            form: Vec::new(),
            cookie: None,
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            ..Self::get(url)
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn with_form(mut self, form: Vec<(String, String)>) -> Self {
        self.form = form;
        self
    }

    pub fn with_cookie(mut self, cookie: String) -> Self {
        if !cookie.is_empty() {
            self.cookie = Some(cookie);
        }
        self
    }
}

#[cfg(test)]
impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// HTTP 回應
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// 最終的 URL（含 query）
    pub url: String,
    /// 回應中 `Set-Cookie` 的 name/value
    pub cookies: Vec<(String, String)>,
    pub body: String,
}

/// HTTP 傳輸層 trait，方便在測試中替換
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// reqwest 實作
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// 建立新的 transport，`config.proxy` 有值時經由 proxy
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = Client::builder().timeout(Duration::from_secs(config.timeout_secs));

        if let Some(proxy) = config.proxy.as_deref() {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| Error::Transport(format!("proxy 設定錯誤 ({}): {}", proxy, e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(format!("無法建立 HTTP 客戶端: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(cookie) = &request.cookie {
            builder = builder.header(COOKIE, cookie.as_str());
        }
        if !request.form.is_empty() {
            builder = builder.form(&request.form);
        }

        let response = builder.send().await?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let cookies = response
            .cookies()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect::<Vec<_>>();
        let body = response.text().await?;

        debug!(status, url = %url, cookies = cookies.len(), "HTTP 回應");

        Ok(HttpResponse {
            status,
            url,
            cookies,
            body,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builders() {
        let request = HttpRequest::post("https://example.com")
            .with_query(vec![("a".to_string(), "1".to_string())])
            .with_headers(vec![("Referer".to_string(), "https://www.taobao.com/".to_string())])
            .with_cookie(String::new());

        assert_eq!(request.method, Method::Post);
        assert_eq!(request.query_value("a"), Some("1"));
        assert_eq!(request.header("referer"), Some("https://www.taobao.com/"));
        assert!(request.cookie.is_none());
    }

    #[test]
    fn test_reqwest_transport_builds() {
        let config = ClientConfig::default();
        assert!(ReqwestTransport::new(&config).is_ok());

        let config = config.with_proxy(Some("http://127.0.0.1:8080".to_string()));
        assert!(ReqwestTransport::new(&config).is_ok());
    }
}
