//! mtop 簽名：`md5(token & t & appKey & data)`，小寫 hex

/// 簽名字串的分隔字元
pub const SEPARATOR: char = '&';

/// 組出待簽名的字串
pub fn compose(token: &str, timestamp: i64, app_key: &str, data: &str) -> String {
    format!(
        "{token}{sep}{timestamp}{sep}{app_key}{sep}{data}",
        sep = SEPARATOR
    )
}

/// 計算簽名
pub fn sign(canonical: &str) -> String {
    format!("{:x}", md5::compute(canonical.as_bytes()))
}
