use crate::types::{ImageIdentifier, SearchResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 支援的平台
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Ali1688,
    Taobao,
}

impl Platform {
    pub fn all() -> Vec<Platform> {
        vec![Platform::Ali1688, Platform::Taobao]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Platform::Ali1688 => "1688",
            Platform::Taobao => "taobao",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 上傳 client 的狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// session 與 token 已就緒
    Ready,
    Uploaded,
    /// 終止狀態，需要新的 session
    UploadFailed,
}

/// 上傳 API 的回應
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub ret: Vec<String>,
    #[serde(default)]
    pub data: Option<UploadPayload>,
}

/// `data` 欄位；被拒絕時可能是空字串或其他形狀
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UploadPayload {
    Data(UploadData),
    Other(serde::de::IgnoredAny),
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadData {
    #[serde(rename = "imageId", default)]
    pub image_id: Option<ImageIdValue>,
}

/// imageId 可能是字串或數字
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ImageIdValue {
    Text(String),
    Number(u64),
}

impl UploadResponse {
    /// `data.imageId`
    pub fn image_id(&self) -> Option<String> {
        match self.data.as_ref()? {
            UploadPayload::Data(UploadData {
                image_id: Some(ImageIdValue::Text(id)),
            }) => Some(id.clone()),
            UploadPayload::Data(UploadData {
                image_id: Some(ImageIdValue::Number(id)),
            }) => Some(id.to_string()),
            _ => None,
        }
    }
}

/// 單一平台的執行結果
#[derive(Debug, Clone)]
pub struct PlatformReport {
    pub platform: Platform,
    /// 使用的 session 策略
    pub strategy: Option<String>,
    pub image_id: Option<ImageIdentifier>,
    pub search: Option<SearchResult>,
    pub error: Option<String>,
}

impl PlatformReport {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            strategy: None,
            image_id: None,
            search: None,
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.search.is_some()
    }
}
