use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// 預設 User-Agent
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// `CHANGE_USER_AGENT=true` 時使用的 User-Agent
pub const ALT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 以圖搜圖工具（1688 / 淘寶）
#[derive(Parser, Debug, Clone)]
#[command(name = "mtop-image-search")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub session: SessionArgs,

    /// 請求超時（秒）
    #[arg(long, default_value_t = 30, env = "MTOP_TIMEOUT", global = true)]
    pub timeout: u64,

    /// proxy URL，可重複指定；第 i 個平台使用第 i % n 個
    #[arg(long = "proxy", env = "MTOP_PROXY", value_delimiter = ',', global = true)]
    pub proxies: Vec<String>,

    /// 改用另一組 User-Agent
    #[arg(long, env = "CHANGE_USER_AGENT", global = true)]
    pub alt_user_agent: bool,

    /// 顯示 debug 訊息
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// 上傳圖片並搜尋
    Run {
        /// 圖片路徑
        image: PathBuf,

        #[arg(long, value_enum, default_value_t = PlatformChoice::All)]
        platform: PlatformChoice,
    },
    /// 只用既有的圖片 ID 搜尋
    Search {
        image_id: String,

        #[arg(long, value_enum, default_value_t = PlatformChoice::Taobao)]
        platform: PlatformChoice,
    },
}

/// session 來源設定
#[derive(Args, Debug, Clone, Default)]
pub struct SessionArgs {
    /// `_m_h5_tk` cookie 值
    #[arg(long, env = "MTOP_TOKEN", global = true)]
    pub token: Option<String>,

    /// cookie JSON 檔（name -> value）
    #[arg(long, env = "MTOP_COOKIE_FILE", global = true)]
    pub cookie_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlatformChoice {
    #[value(name = "1688")]
    Ali1688,
    Taobao,
    All,
}

/// 每個 client 的連線設定
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// 請求超時（秒）
    pub timeout_secs: u64,
    pub user_agent: String,
    pub proxy: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }
}

/// proxy 清單，取代全域狀態
#[derive(Debug, Clone, Default)]
pub struct ProxyConfig {
    proxies: Vec<String>,
}

impl ProxyConfig {
    pub fn new(proxies: Vec<String>) -> Self {
        let proxies = proxies
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        Self { proxies }
    }

    /// 第 `index` 個 client 使用的 proxy
    pub fn select(&self, index: usize) -> Option<String> {
        if self.proxies.is_empty() {
            None
        } else {
            Some(self.proxies[index % self.proxies.len()].clone())
        }
    }
}

impl Cli {
    pub fn client_config(&self) -> ClientConfig {
        let user_agent = if self.alt_user_agent {
            ALT_USER_AGENT
        } else {
            DEFAULT_USER_AGENT
        };

        ClientConfig::new()
            .with_timeout(self.timeout)
            .with_user_agent(user_agent)
    }

    pub fn proxy_config(&self) -> ProxyConfig {
        ProxyConfig::new(self.proxies.clone())
    }
}
