use super::{
    services,
    trait_def::PlatformClient,
    types::{Platform, PlatformReport},
};
use crate::config::{ClientConfig, ProxyConfig, SessionArgs};
use crate::mtop::{
    CookieFileStrategy, Credentials, ExternalTokenStrategy, FetchedSessionStrategy,
    SessionStrategy, TokenSource,
};
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::types::ImageIdentifier;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 依序執行 session 解析 -> 上傳 -> 搜尋
pub struct ImageSearchEngine {
    config: ClientConfig,
    proxies: ProxyConfig,
    session: SessionArgs,
    transport: Option<Arc<dyn HttpTransport>>,
    show_progress: bool,
}

impl ImageSearchEngine {
    pub fn new(config: ClientConfig, proxies: ProxyConfig, session: SessionArgs) -> Self {
        Self {
            config,
            proxies,
            session,
            transport: None,
            show_progress: true,
        }
    }

    /// 關閉 spinner（debug log 會直接寫到終端機）
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// 所有平台共用指定的 transport（不套用 proxy 設定）
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    fn transport_for(&self, index: usize) -> Result<Arc<dyn HttpTransport>> {
        if let Some(transport) = &self.transport {
            return Ok(Arc::clone(transport));
        }

        let config = self.config.clone().with_proxy(self.proxies.select(index));
        let transport = ReqwestTransport::new(&config)
            .context("無法建立 HTTP 客戶端")?;
        Ok(Arc::new(transport))
    }

    /// 依序嘗試的 session 策略：token -> cookie 檔 -> 匿名 session
    pub fn strategies(
        &self,
        platform: Platform,
        transport: Arc<dyn HttpTransport>,
    ) -> Vec<Box<dyn SessionStrategy>> {
        let mut strategies: Vec<Box<dyn SessionStrategy>> = vec![];

        if let Some(token) = &self.session.token {
            strategies.push(Box::new(ExternalTokenStrategy::new(token.clone())));
        }
        if let Some(path) = &self.session.cookie_file {
            strategies.push(Box::new(CookieFileStrategy::new(path.clone())));
        }
        strategies.push(Box::new(FetchedSessionStrategy::new(
            transport,
            services::token_api(platform),
            services::default_headers(platform, &self.config),
        )));

        strategies
    }

    /// 回傳第一個成功的策略
    pub async fn resolve_credentials(
        strategies: &[Box<dyn SessionStrategy>],
    ) -> Result<(String, Credentials)> {
        let mut failures = vec![];

        for strategy in strategies {
            match strategy.resolve().await {
                Ok(credentials) => {
                    info!(
                        strategy = strategy.name(),
                        domain = credentials.current_session().domain(),
                        cookies = credentials.current_session().len(),
                        token_issued_at = ?credentials.current_token().issued_at,
                        "session 就緒"
                    );
                    return Ok((strategy.name().to_string(), credentials));
                }
                Err(e) => {
                    info!(strategy = strategy.name(), error = %e, "session 策略失敗，改用下一個");
                    failures.push(format!("{}: {}", strategy.name(), e));
                }
            }
        }

        Err(anyhow::anyhow!("所有 session 策略都失敗 ({})", failures.join("; ")))
    }

    /// 上傳並搜尋
    pub async fn run(&self, image: &Path, platforms: &[Platform]) -> Result<Vec<PlatformReport>> {
        let spinner = if self.show_progress {
            spinner()
        } else {
            ProgressBar::hidden()
        };
        let mut reports = vec![];

        for (index, platform) in platforms.iter().enumerate() {
            let mut report = PlatformReport::new(*platform);

            if let Err(e) = self.run_platform(index, image, &mut report, &spinner).await {
                spinner.suspend(|| warn!(platform = %platform, error = %e, "流程中止"));
                report.error = Some(format!("{:#}", e));
            }

            reports.push(report);
        }

        spinner.finish_and_clear();
        Ok(reports)
    }

    async fn run_platform(
        &self,
        index: usize,
        image: &Path,
        report: &mut PlatformReport,
        spinner: &ProgressBar,
    ) -> Result<()> {
        let platform = report.platform;
        let transport = self.transport_for(index)?;

        spinner.set_message(format!("🔑 [{}] 取得 session...", platform));
        let strategies = self.strategies(platform, Arc::clone(&transport));
        let (strategy, credentials) = Self::resolve_credentials(&strategies).await?;
        report.strategy = Some(strategy);

        let mut client: PlatformClient =
            services::build_client(platform, transport, credentials, &self.config);

        spinner.set_message(format!("📤 [{}] 上傳圖片...", platform));
        let image_id = client
            .upload(image)
            .await
            .with_context(|| format!("[{}] 上傳失敗", platform))?;
        report.image_id = Some(image_id.clone());
        debug!(platform = %client.platform(), state = ?client.state(), "client 狀態");

        // 上傳成功後搜尋失敗時，image_id 仍保留在報告中可手動重試
        spinner.set_message(format!("🔎 [{}] 搜尋中...", platform));
        let result = client
            .search(&image_id)
            .await
            .with_context(|| format!("[{}] 搜尋失敗", platform))?;
        report.search = Some(result);

        Ok(())
    }

    /// 只執行搜尋
    pub async fn search_only(
        &self,
        image_id: &ImageIdentifier,
        platforms: &[Platform],
    ) -> Result<Vec<PlatformReport>> {
        let mut reports = vec![];

        for (index, platform) in platforms.iter().enumerate() {
            let mut report = PlatformReport::new(*platform);
            report.image_id = Some(image_id.clone());

            let transport = match self.transport_for(index) {
                Ok(transport) => transport,
                Err(e) => {
                    warn!(platform = %platform, error = %e, "無法建立 transport");
                    report.error = Some(format!("{:#}", e));
                    reports.push(report);
                    continue;
                }
            };
            let searcher = services::build_search_client(*platform, transport, &self.config);

            match searcher.search(image_id).await {
                Ok(result) => report.search = Some(result),
                Err(e) => report.error = Some(e.to_string()),
            }

            reports.push(report);
        }

        Ok(reports)
    }
}

fn spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_search::services::test_support::image_file;
    use crate::transport::HttpResponse;
    use crate::transport::fake::FakeTransport;

    fn engine(session: SessionArgs, transport: Arc<FakeTransport>) -> ImageSearchEngine {
        ImageSearchEngine::new(ClientConfig::default(), ProxyConfig::default(), session)
            .with_transport(transport)
            .with_progress(false)
    }

    #[tokio::test]
    async fn test_run_with_token() {
        let transport = Arc::new(
            FakeTransport::new()
                .respond_json(r#"{"data":{"imageId":"999"}}"#)
                .respond_json("<html>ok</html>"),
        );
        let session = SessionArgs {
            token: Some("ABC123_1700000000000_xyz".to_string()),
            cookie_file: None,
        };
        let file = image_file(b"image");

        let reports = engine(session, transport.clone())
            .run(file.path(), &[Platform::Taobao])
            .await
            .unwrap();

        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert!(report.is_success());
        assert_eq!(report.strategy.as_deref(), Some("token"));
        assert_eq!(report.image_id.as_ref().unwrap().as_str(), "999");
        assert!(report.search.as_ref().unwrap().url.ends_with("imageId=999"));
    }

    #[tokio::test]
    async fn test_falls_back_to_fetched_session() {
        let transport = Arc::new(
            FakeTransport::new()
                .respond(HttpResponse {
                    status: 200,
                    url: String::new(),
                    cookies: vec![("_m_h5_tk".to_string(), "fresh_1700000000000".to_string())],
                    body: String::new(),
                })
                .respond_json(r#"{"data":{"imageId":"42"}}"#)
                .respond_json("<html>ok</html>"),
        );
        let session = SessionArgs {
            token: Some("no-delimiter".to_string()),
            cookie_file: Some("/nonexistent/cookies.json".into()),
        };
        let file = image_file(b"image");

        let reports = engine(session, transport.clone())
            .run(file.path(), &[Platform::Ali1688])
            .await
            .unwrap();

        let report = &reports[0];
        assert!(report.is_success());
        assert_eq!(report.strategy.as_deref(), Some("fetched-session"));

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].cookie.as_deref(), Some("_m_h5_tk=fresh_1700000000000"));
    }

    #[tokio::test]
    async fn test_search_failure_keeps_image_id() {
        let transport = Arc::new(
            FakeTransport::new()
                .respond_json(r#"{"data":{"imageId":"999"}}"#)
                .fail("connection reset"),
        );
        let session = SessionArgs {
            token: Some("ABC123_1".to_string()),
            cookie_file: None,
        };
        let file = image_file(b"image");

        let reports = engine(session, transport)
            .run(file.path(), &[Platform::Taobao])
            .await
            .unwrap();

        let report = &reports[0];
        assert!(!report.is_success());
        assert_eq!(report.image_id.as_ref().unwrap().as_str(), "999");
        assert!(report.error.as_ref().unwrap().contains("搜尋失敗"));
    }

    #[tokio::test]
    async fn test_all_strategies_fail() {
        let transport = Arc::new(FakeTransport::new().respond_json("{}"));
        let file = image_file(b"image");

        let reports = engine(SessionArgs::default(), transport)
            .run(file.path(), &[Platform::Taobao])
            .await
            .unwrap();

        let report = &reports[0];
        assert!(report.strategy.is_none());
        assert!(report.error.as_ref().unwrap().contains("fetched-session"));
    }

    #[tokio::test]
    async fn test_search_only() {
        let transport = Arc::new(
            FakeTransport::new()
                .respond_json("<html>1688</html>")
                .respond_json("<html>taobao</html>"),
        );
        let image_id = ImageIdentifier::new("999").unwrap();

        let reports = engine(SessionArgs::default(), transport.clone())
            .search_only(&image_id, &Platform::all())
            .await
            .unwrap();

        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.is_success()));
        assert!(transport.requests()[0].url.starts_with("https://s.1688.com/"));
        assert!(transport.requests()[1].url.starts_with("https://s.taobao.com/"));
    }

    #[tokio::test]
    async fn test_search_only_records_invalid_proxy() {
        let engine = ImageSearchEngine::new(
            ClientConfig::default(),
            ProxyConfig::new(vec!["http://[::1".to_string()]),
            SessionArgs::default(),
        )
        .with_progress(false);
        let image_id = ImageIdentifier::new("999").unwrap();

        let reports = engine.search_only(&image_id, &Platform::all()).await.unwrap();

        assert_eq!(reports.len(), 2);
        for report in &reports {
            assert!(report.search.is_none());
            assert!(report.error.as_ref().unwrap().contains("HTTP"));
            assert_eq!(report.image_id.as_ref().unwrap().as_str(), "999");
        }
    }

    #[test]
    fn test_progress_flag() {
        let engine = ImageSearchEngine::new(
            ClientConfig::default(),
            ProxyConfig::default(),
            SessionArgs::default(),
        );
        assert!(engine.show_progress);
        assert!(!engine.with_progress(false).show_progress);
    }
}
