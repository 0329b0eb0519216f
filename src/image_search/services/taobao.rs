use super::MtopUploader;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::image_search::{
    trait_def::{SearchClient, UploadClient},
    types::ClientState,
    utils,
};
use crate::mtop::{ApiSpec, Credentials, h5_url};
use crate::transport::{HttpRequest, HttpTransport};
use crate::types::{ImageIdentifier, SearchResult};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// 發放匿名 `_m_h5_tk` 的 API
pub const TOKEN_API: &str = "mtop.tmall.hk.yx.worldhomepagepcapi.gethotwords";

/// 上傳時簽名的參數仍沿用 token API，只有 endpoint 換成 recommend
pub const RECOMMEND: ApiSpec = ApiSpec {
    api: TOKEN_API,
    version: "1.0",
    jsv: "2.4.11",
    response_type: "originaljson",
    data_type: "jsonp",
    ecode: Some("0"),
};

const RECOMMEND_API: &str = "mtop.relationrecommend.wirelessrecommend.recommend";
const RECOMMEND_VERSION: &str = "2.0";

const APP_ID: &str = "34850";
const SEARCH_URL: &str = "https://s.taobao.com/search?imgfile=&commend=all&ssid=s5-e&search_type=item&sourceId=tb.index&spm=a21bo.jianhua.201856-taobao-item.1&ie=utf8&initiative_id=tbindexz_20170306";

/// recommend 的內層 params
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecommendParams {
    /// 去掉 `=` padding 的 base64
    strimg: String,
    pc_graph_search: bool,
    sort_order: u8,
    tab: &'static str,
    vm: &'static str,
}

/// recommend 的 data 欄位，params 是再次序列化的 JSON 字串
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecommendData {
    params: String,
    app_id: &'static str,
}

pub fn headers(config: &ClientConfig) -> Vec<(String, String)> {
    vec![
        ("User-Agent".to_string(), config.user_agent.clone()),
        ("Referer".to_string(), "https://www.taobao.com/".to_string()),
        ("Accept".to_string(), "application/json".to_string()),
        (
            "Accept-Language".to_string(),
            "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7".to_string(),
        ),
    ]
}

/// 組出 recommend 的 data JSON
pub fn upload_data(bytes: &[u8]) -> Result<String> {
    let params = RecommendParams {
        strimg: utils::encode_image(bytes, true),
        pc_graph_search: true,
        sort_order: 0,
        tab: "all",
        vm: "nv",
    };

    let data = RecommendData {
        params: serde_json::to_string(&params)?,
        app_id: APP_ID,
    };
    Ok(serde_json::to_string(&data)?)
}

pub struct TaobaoUpload {
    inner: MtopUploader,
}

impl TaobaoUpload {
    pub fn new(transport: Arc<dyn HttpTransport>, credentials: Credentials, config: &ClientConfig) -> Self {
        Self {
            inner: MtopUploader::new(transport, credentials, headers(config)),
        }
    }

    /// recommend 的 endpoint（保留結尾的 `/`）
    pub fn upload_url() -> String {
        h5_url(RECOMMEND_API, RECOMMEND_VERSION)
    }
}

#[async_trait::async_trait]
impl UploadClient for TaobaoUpload {
    fn state(&self) -> ClientState {
        self.inner.state()
    }

    async fn upload(&mut self, path: &Path) -> Result<ImageIdentifier> {
        self.inner
            .upload(path, &RECOMMEND, &Self::upload_url(), upload_data)
            .await
    }
}

pub struct TaobaoSearch {
    transport: Arc<dyn HttpTransport>,
    headers: Vec<(String, String)>,
}

impl TaobaoSearch {
    pub fn new(transport: Arc<dyn HttpTransport>, config: &ClientConfig) -> Self {
        Self {
            transport,
            headers: headers(config),
        }
    }
}

#[async_trait::async_trait]
impl SearchClient for TaobaoSearch {
    fn search_url(&self, image_id: &ImageIdentifier) -> String {
        format!("{}&imageId={}", SEARCH_URL, urlencoding::encode(image_id.as_str()))
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
