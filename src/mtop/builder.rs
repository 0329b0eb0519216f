use super::token::{Credentials, TokenSource};
use super::{APP_KEY, h5_url, now_millis, signer};
use crate::types::RequestParameters;

/// 單一 mtop API 的固定參數
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiSpec {
    pub api: &'static str,
    pub version: &'static str,
    pub jsv: &'static str,
    /// `type` 參數
    pub response_type: &'static str,
    pub data_type: &'static str,
    pub ecode: Option<&'static str>,
}

impl ApiSpec {
    pub fn url(&self) -> String {
        h5_url(self.api, self.version)
    }
}

/// 組出帶簽名的請求參數
///
/// 只能由已解析的 [`Credentials`] 建立，因此 token 一定存在。
#[derive(Debug, Clone)]
pub struct SignedRequestBuilder {
    credentials: Credentials,
    app_key: String,
}

impl SignedRequestBuilder {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            app_key: APP_KEY.to_string(),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn build(&self, spec: &ApiSpec, body: &str, timestamp: i64) -> RequestParameters {
        let canonical = signer::compose(
            &self.credentials.current_token().value,
            timestamp,
            &self.app_key,
            body,
        );
        let sign = signer::sign(&canonical);

        let mut params = RequestParameters::new();
        params.push("jsv", spec.jsv);
        params.push("appKey", self.app_key.as_str());
        params.push("t", timestamp.to_string());
        params.push("api", spec.api);
        if let Some(ecode) = spec.ecode {
            params.push("ecode", ecode);
        }
        params.push("v", spec.version);
        params.push("type", spec.response_type);
        params.push("dataType", spec.data_type);
        params.push("sign", sign);
        params
    }

    /// 使用目前時間
    pub fn build_now(&self, spec: &ApiSpec, body: &str) -> RequestParameters {
        self.build(spec, body, now_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Session, TAOBAO_DOMAIN};

    const SPEC: ApiSpec = ApiSpec {
        api: "mtop.1688.imageService.putImage",
        version: "1.0",
        jsv: "2.4.11",
        response_type: "originaljson",
        data_type: "jsonp",
        ecode: Some("0"),
    };

    fn builder() -> SignedRequestBuilder {
        let session = Session::new(TAOBAO_DOMAIN, [("_m_h5_tk", "ABC123_1700000000000")]);
        SignedRequestBuilder::new(Credentials::from_session(session).unwrap())
    }

    #[test]
    fn test_build_parameters() {
        let params = builder().build(&SPEC, "{\"a\":1}", 1700000000123);

        assert_eq!(
            params.keys(),
            vec!["jsv", "appKey", "t", "api", "ecode", "v", "type", "dataType", "sign"]
        );
        assert_eq!(params.get("appKey"), Some(APP_KEY));
        assert_eq!(params.get("t"), Some("1700000000123"));
        assert_eq!(params.get("api"), Some("mtop.1688.imageService.putImage"));
        assert_eq!(
            params.get("sign").unwrap(),
            signer::sign("ABC123&1700000000123&12574478&{\"a\":1}")
        );
    }

    #[test]
    fn test_build_without_ecode() {
        let spec = ApiSpec { ecode: None, ..SPEC };
        let params = builder().build(&spec, "{}", 1);
        assert!(params.get("ecode").is_none());
        assert_eq!(params.keys().len(), 8);
    }

    #[test]
    fn test_timestamp_changes_signature() {
        let builder = builder();
        let first = builder.build(&SPEC, "{}", 1700000000000);
        let second = builder.build(&SPEC, "{}", 1700000000001);

        assert_ne!(first.get("t"), second.get("t"));
        assert_ne!(first.get("sign"), second.get("sign"));
    }

    #[test]
    fn test_same_input_same_signature() {
        let builder = builder();
        assert_eq!(builder.build(&SPEC, "{}", 5), builder.build(&SPEC, "{}", 5));
    }
}
