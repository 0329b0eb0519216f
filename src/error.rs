use std::path::PathBuf;
use thiserror::Error;

/// 簽名、上傳與搜尋流程的錯誤
#[derive(Debug, Error)]
pub enum Error {
    /// cookie 或回應中找不到可用的 token
    #[error("找不到可用的 token: {0}")]
    MissingToken(String),

    /// 伺服器沒有回傳可用的 data（通常代表 session 已過期）
    #[error("上傳被拒絕: {}", .ret.join(", "))]
    UploadRejected { ret: Vec<String> },

    /// 網路或連線錯誤
    #[error("連線錯誤: {0}")]
    Transport(String),

    /// 本機檔案無法讀取
    #[error("無法讀取檔案 {}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// cookie 檔案格式不是 name -> value 的 JSON 物件
    #[error("cookie 檔案格式錯誤 {}: {reason}", .path.display())]
    InvalidCookieFile { path: PathBuf, reason: String },

    /// 回應不是預期的 JSON
    #[error("無法解析回應: {0}")]
    InvalidResponse(String),

    /// client 已經上傳失敗，必須以新的 session 重新建立
    #[error("client 狀態錯誤: {0}")]
    ClientState(&'static str),

    #[error("序列化失敗: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}
