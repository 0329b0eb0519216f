use super::MtopUploader;
use crate::error::Result;
use crate::image_search::{
    trait_def::{SearchClient, UploadClient},
    types::ClientState,
    utils,
};
use crate::mtop::{ApiSpec, Credentials};
use crate::transport::{HttpRequest, HttpTransport};
use crate::types::{ImageIdentifier, SearchResult};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

pub const PUT_IMAGE: ApiSpec = ApiSpec {
    api: "mtop.1688.imageService.putImage",
    version: "1.0",
    jsv: "2.4.11",
    response_type: "originaljson",
    data_type: "jsonp",
    ecode: Some("0"),
};

const APP_NAME: &str = "searchImageUpload";
const IMAGE_APP_KEY: &str = "pvvljh1grxcmaay2vgpe9nb68gg9ueg2";
const SEARCH_URL: &str = "https://s.1688.com/youyuan/index.htm";

/// 1688 固定使用的 User-Agent，不受 `--alt-user-agent` 影響
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:85.0) Gecko/20100101 Firefox/85.0";

/// putImage 的 data 欄位
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PutImageData<'a> {
    /// 保留 `=` padding
    image_base64: String,
    app_name: &'a str,
    app_key: &'a str,
}

pub fn headers() -> Vec<(String, String)> {
    vec![("User-Agent".to_string(), USER_AGENT.to_string())]
}

/// 組出 putImage 的 data JSON
pub fn upload_data(bytes: &[u8]) -> Result<String> {
    let data = PutImageData {
        image_base64: utils::encode_image(bytes, false),
        app_name: APP_NAME,
        app_key: IMAGE_APP_KEY,
    };
    Ok(serde_json::to_string(&data)?)
}

pub struct Ali1688Upload {
    inner: MtopUploader,
}

impl Ali1688Upload {
    pub fn new(transport: Arc<dyn HttpTransport>, credentials: Credentials) -> Self {
        Self {
            inner: MtopUploader::new(transport, credentials, headers()),
        }
    }

    /// putImage 的 endpoint（沒有結尾的 `/`）
    pub fn upload_url() -> String {
        PUT_IMAGE.url().trim_end_matches('/').to_string()
    }
}

#[async_trait::async_trait]
impl UploadClient for Ali1688Upload {
    fn state(&self) -> ClientState {
        self.inner.state()
    }

    async fn upload(&mut self, path: &Path) -> Result<ImageIdentifier> {
        self.inner
            .upload(path, &PUT_IMAGE, &Self::upload_url(), upload_data)
            .await
    }
}

/// 1688 公開的以圖搜圖頁
pub struct Ali1688Search {
    transport: Arc<dyn HttpTransport>,
    headers: Vec<(String, String)>,
}

impl Ali1688Search {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            headers: headers(),
        }
    }
}

#[async_trait::async_trait]
impl SearchClient for Ali1688Search {
    fn search_url(&self, image_id: &ImageIdentifier) -> String {
        let id = urlencoding::encode(image_id.as_str());
        format!("{}?tab=imageSearch&imageId={}&imageIdList={}", SEARCH_URL, id, id)
    }

    async fn search(&self, image_id: &ImageIdentifier) -> Result<SearchResult> {
        let url = self.search_url(image_id);
        let response = self
            .transport
            .send(HttpRequest::get(url.clone()).with_headers(self.headers.clone()))
            .await?;

        Ok(SearchResult {
            url,
            status: response.status,
            body: response.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::image_search::services::test_support::{credentials, image_file};
    use crate::mtop::signer;
    use crate::transport::{Method, fake::FakeTransport};

    #[test]
    fn test_upload_data_keeps_padding() {
        let data = upload_data(b"a").unwrap();
        assert_eq!(
            data,
            r#"{"imageBase64":"YQ==","appName":"searchImageUpload","appKey":"pvvljh1grxcmaay2vgpe9nb68gg9ueg2"}"#
        );
    }

    #[tokio::test]
    async fn test_upload_request() {
        let transport = Arc::new(FakeTransport::new().respond_json(r#"{"data":{"imageId":"999"}}"#));
        let mut client = Ali1688Upload::new(transport.clone(), credentials());
        let file = image_file(b"a");

        let image_id = client.upload(file.path()).await.unwrap();
        assert_eq!(image_id.as_str(), "999");
        assert_eq!(client.state(), ClientState::Uploaded);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(
            request.url,
            "https://h5api.m.taobao.com/h5/mtop.1688.imageservice.putimage/1.0"
        );
        assert_eq!(request.header("Content-Type"), Some("application/x-www-form-urlencoded"));
        assert_eq!(request.header("User-Agent"), Some(USER_AGENT));
        assert_eq!(request.cookie.as_deref(), Some("_m_h5_tk=ABC123_1700000000000; cna=xyz"));
        assert_eq!(request.query_value("ecode"), Some("0"));
        assert_eq!(request.query_value("v"), Some("1.0"));

        let data = &request.form[0];
        assert_eq!(data.0, "data");
        let t = request.query_value("t").unwrap();
        let expected = signer::sign(&format!("ABC123&{}&12574478&{}", t, data.1));
        assert_eq!(request.query_value("sign"), Some(expected.as_str()));
    }

    #[tokio::test]
    async fn test_upload_empty_file() {
        let transport = Arc::new(FakeTransport::new().respond_json(r#"{"data":{"imageId":"1"}}"#));
        let mut client = Ali1688Upload::new(transport.clone(), credentials());
        let file = image_file(b"");

        client.upload(file.path()).await.unwrap();
        let form = &transport.requests()[0].form;
        assert!(form[0].1.contains(r#""imageBase64":"""#));
    }

    #[tokio::test]
    async fn test_upload_missing_file_sends_nothing() {
        let transport = Arc::new(FakeTransport::new());
        let mut client = Ali1688Upload::new(transport.clone(), credentials());

        let result = client.upload(Path::new("/nonexistent/image.jpg")).await;
        assert!(matches!(result, Err(Error::FileAccess { .. })));
        assert!(transport.requests().is_empty());
        assert_eq!(client.state(), ClientState::Ready);
    }

    #[tokio::test]
    async fn test_search_url() {
        let transport = Arc::new(FakeTransport::new().respond_json("<html></html>"));
        let search = Ali1688Search::new(transport.clone());
        let image_id = ImageIdentifier::new("999").unwrap();

        let result = search.search(&image_id).await.unwrap();
        assert_eq!(
            result.url,
            "https://s.1688.com/youyuan/index.htm?tab=imageSearch&imageId=999&imageIdList=999"
        );
        assert_eq!(result.status, 200);
        assert_eq!(transport.requests()[0].method, Method::Get);
        assert_eq!(transport.requests()[0].header("User-Agent"), Some(USER_AGENT));
    }
}
