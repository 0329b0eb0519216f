//! 淘寶系 h5 mtop 介面的簽名協定
pub mod signer;
pub mod token;
pub mod builder;

pub use builder::{ApiSpec, SignedRequestBuilder};
pub use token::{
    CookieFileStrategy, Credentials, ExternalTokenStrategy, FetchedSessionStrategy,
    SessionStrategy, TokenSource,
};

/// 網頁版 h5 使用的 appKey
pub const APP_KEY: &str = "12574478";

/// mtop gateway
pub const H5_HOST: &str = "h5api.m.taobao.com";

/// `https://h5api.m.taobao.com/h5/<api>/<version>/`
pub fn h5_url(api: &str, version: &str) -> String {
    format!("https://{}/h5/{}/{}/", H5_HOST, api.to_lowercase(), version)
}

/// 目前的毫秒時間戳
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_h5_url_lowercases_api() {
        assert_eq!(
            h5_url("mtop.1688.imageService.putImage", "1.0"),
            "https://h5api.m.taobao.com/h5/mtop.1688.imageservice.putimage/1.0/"
        );
    }
}
