use super::types::{ClientState, Platform};
use crate::error::Result;
use crate::types::{ImageIdentifier, SearchResult};
use std::path::Path;

/// 上傳圖片取得圖片 ID
#[async_trait::async_trait]
pub trait UploadClient: Send + Sync {
    fn state(&self) -> ClientState;

    /// 單次嘗試，失敗不重試
    async fn upload(&mut self, path: &Path) -> Result<ImageIdentifier>;
}

/// 以圖片 ID 搜尋
#[async_trait::async_trait]
pub trait SearchClient: Send + Sync {
    fn search_url(&self, image_id: &ImageIdentifier) -> String;

    async fn search(&self, image_id: &ImageIdentifier) -> Result<SearchResult>;
}

/// 單一平台的上傳 + 搜尋
pub struct PlatformClient {
    platform: Platform,
    uploader: Box<dyn UploadClient>,
    searcher: Box<dyn SearchClient>,
}

impl PlatformClient {
    pub fn new(
        platform: Platform,
        uploader: Box<dyn UploadClient>,
        searcher: Box<dyn SearchClient>,
    ) -> Self {
        Self {
            platform,
            uploader,
            searcher,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn state(&self) -> ClientState {
        self.uploader.state()
    }

    pub async fn upload(&mut self, path: &Path) -> Result<ImageIdentifier> {
        self.uploader.upload(path).await
    }

    pub async fn search(&self, image_id: &ImageIdentifier) -> Result<SearchResult> {
        self.searcher.search(image_id).await
    }
}
