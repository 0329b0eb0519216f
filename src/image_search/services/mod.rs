pub mod ali1688;
pub mod taobao;

use super::trait_def::PlatformClient;
use super::types::{ClientState, Platform};
use super::utils;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::mtop::{ApiSpec, Credentials, SignedRequestBuilder, TokenSource};
use crate::transport::{HttpRequest, HttpTransport};
use crate::types::ImageIdentifier;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// 建立平台的上傳 + 搜尋 client
pub fn build_client(
    platform: Platform,
    transport: Arc<dyn HttpTransport>,
    credentials: Credentials,
    config: &ClientConfig,
) -> PlatformClient {
    match platform {
        Platform::Ali1688 => PlatformClient::new(
            platform,
            Box::new(ali1688::Ali1688Upload::new(transport.clone(), credentials)),
            Box::new(ali1688::Ali1688Search::new(transport)),
        ),
        Platform::Taobao => PlatformClient::new(
            platform,
            Box::new(taobao::TaobaoUpload::new(transport.clone(), credentials, config)),
            Box::new(taobao::TaobaoSearch::new(transport, config)),
        ),
    }
}

/// 只需要搜尋時使用（公開的搜尋頁不需要 session）
pub fn build_search_client(
    platform: Platform,
    transport: Arc<dyn HttpTransport>,
    config: &ClientConfig,
) -> Box<dyn super::trait_def::SearchClient> {
    match platform {
        Platform::Ali1688 => Box::new(ali1688::Ali1688Search::new(transport)),
        Platform::Taobao => Box::new(taobao::TaobaoSearch::new(transport, config)),
    }
}

/// 取得 session 時 token endpoint 使用的 API
pub fn token_api(platform: Platform) -> &'static str {
    match platform {
        Platform::Ali1688 => ali1688::PUT_IMAGE.api,
        Platform::Taobao => taobao::TOKEN_API,
    }
}

/// 平台的預設 header
pub fn default_headers(platform: Platform, config: &ClientConfig) -> Vec<(String, String)> {
    match platform {
        Platform::Ali1688 => ali1688::headers(),
        Platform::Taobao => taobao::headers(config),
    }
}

/// 各平台共用的 mtop 上傳流程
pub(crate) struct MtopUploader {
    transport: Arc<dyn HttpTransport>,
    builder: SignedRequestBuilder,
    headers: Vec<(String, String)>,
    state: ClientState,
}

impl MtopUploader {
    pub(crate) fn new(
        transport: Arc<dyn HttpTransport>,
        credentials: Credentials,
        headers: Vec<(String, String)>,
    ) -> Self {
        Self {
            transport,
            builder: SignedRequestBuilder::new(credentials),
            headers,
            state: ClientState::Ready,
        }
    }

    pub(crate) fn state(&self) -> ClientState {
        self.state
    }

    /// 讀檔 -> 組 envelope -> 簽名 -> POST -> 解析 imageId
    pub(crate) async fn upload<F>(
        &mut self,
        path: &Path,
        spec: &ApiSpec,
        url: &str,
        envelope: F,
    ) -> Result<ImageIdentifier>
    where
        F: FnOnce(&[u8]) -> Result<String> + Send,
    {
        if self.state == ClientState::UploadFailed {
            return Err(Error::ClientState("上傳已失敗，請以新的 session 重新建立 client"));
        }

        // 讀檔失敗時不會發出任何請求
        let bytes = utils::read_image(path)?;
        debug!(
            path = %path.display(),
            size = bytes.len(),
            sha256 = %utils::fingerprint(&bytes),
            "讀取圖片"
        );

        let data = envelope(&bytes)?;
        let params = self.builder.build_now(spec, &data);
        let cookie = self.builder.credentials().current_session().cookie_header();

        let mut headers = self.headers.clone();
        headers.push((
            "Content-Type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        ));

        let request = HttpRequest::post(url)
            .with_query(params.to_query())
            .with_headers(headers)
            .with_form(vec![("data".to_string(), data)])
            .with_cookie(cookie);

        let result = match self.transport.send(request).await {
            Ok(response) => utils::parse_upload_response(&response.body),
            Err(e) => Err(e),
        };

        match &result {
            Ok(image_id) => {
                info!(api = spec.api, image_id = %image_id, "上傳成功");
                self.state = ClientState::Uploaded;
            }
            Err(e) => {
                info!(api = spec.api, error = %e, "上傳失敗");
                self.state = ClientState::UploadFailed;
            }
        }

        result
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::mtop::Credentials;
    use crate::types::{Session, TAOBAO_DOMAIN};
    use std::io::Write;

    pub fn credentials() -> Credentials {
        let session = Session::new(
            TAOBAO_DOMAIN,
            [("_m_h5_tk", "ABC123_1700000000000"), ("cna", "xyz")],
        );
        Credentials::from_session(session).unwrap()
    }

    pub fn image_file(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file
    }
}
