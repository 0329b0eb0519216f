use super::types::UploadResponse;
use crate::error::{Error, Result};
use crate::types::ImageIdentifier;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// 整個讀入圖片檔
pub fn read_image(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| Error::FileAccess {
        path: path.to_path_buf(),
        source,
    })
}

/// base64 編碼，`strip_padding` 時去掉結尾的 `=`
pub fn encode_image(bytes: &[u8], strip_padding: bool) -> String {
    let encoded = BASE64.encode(bytes);
    if strip_padding {
        encoded.trim_end_matches('=').to_string()
    } else {
        encoded
    }
}

/// 圖片內容雜湊 (SHA256)，只用於 log
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// 去掉 `mtopjsonp1(...)` 外殼
pub fn strip_jsonp(body: &str) -> &str {
    let trimmed = body.trim();
    if trimmed.starts_with('{') {
        return trimmed;
    }

    match (trimmed.find('('), trimmed.rfind(')')) {
        (Some(start), Some(end)) if start < end => &trimmed[start + 1..end],
        _ => trimmed,
    }
}

/// 從上傳回應取出 `data.imageId`
pub fn parse_upload_response(body: &str) -> Result<ImageIdentifier> {
    let response: UploadResponse = serde_json::from_str(strip_jsonp(body))
        .map_err(|e| Error::InvalidResponse(format!("上傳回應不是 JSON: {}", e)))?;

    response
        .image_id()
        .and_then(|id| ImageIdentifier::new(id))
        .ok_or(Error::UploadRejected { ret: response.ret })
}
