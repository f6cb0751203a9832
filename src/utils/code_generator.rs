use rand::Rng;

use crate::error::{AppError, AppResult};

/// 兑奖码字符集: 去掉了容易混淆的 0/O 与 1/I
pub const REDEEM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// 兑奖码长度
pub const REDEEM_CODE_LENGTH: usize = 4;

/// 生成4位兑奖码（均匀随机，不保证全局唯一）
pub fn generate_redeem_code() -> String {
    let mut rng = rand::thread_rng();
    (0..REDEEM_CODE_LENGTH)
        .map(|_| REDEEM_CODE_ALPHABET[rng.gen_range(0..REDEEM_CODE_ALPHABET.len())] as char)
        .collect()
}

/// 规范化管理员输入的兑奖码: 去空白、转大写、校验长度
pub fn normalize_redeem_code(input: &str) -> AppResult<String> {
    let code = input.trim().to_uppercase();
    if code.chars().count() != REDEEM_CODE_LENGTH {
        return Err(AppError::ValidationError(format!(
            "Redeem code must be exactly {REDEEM_CODE_LENGTH} characters"
        )));
    }
    Ok(code)
}
