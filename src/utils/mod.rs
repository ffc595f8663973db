use bcrypt::{hash, verify};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    hash(password.as_bytes(), cost)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password.as_bytes(), hash)
}

/// 内容摘要，用作对象下载地址中的令牌
pub fn content_digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// 上传路径 `cards/{deckId}/{timestamp}-{face}-{fileName}`。
/// 同一张卡片的两面共用一个时间戳，由 `face` 区分同名文件。
pub fn card_image_path(deck_id: &str, face: &str, file_name: &str, at: DateTime<Utc>) -> String {
    let file_name = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    format!("cards/{}/{}-{}-{}", deck_id, at.timestamp_millis(), face, file_name)
}

/// 简单的邮箱格式校验：本地部分与带点的域名
pub fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}
