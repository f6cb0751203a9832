use regex::Regex;
use crate::error::{AppError, AppResult};

/// 验证邮箱格式 (只做基本语法校验)
pub fn validate_email(email: &str) -> AppResult<()> {
    let email_regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
        .map_err(|e| AppError::InternalError(format!("Invalid email pattern: {e}")))?;

    if !email_regex.is_match(email) {
        return Err(AppError::ValidationError(
            "Invalid email address".to_string(),
        ));
    }

    Ok(())
}

/// 规范化可选手机号: 去掉首尾空白，空字符串视为未填写;
/// 填写时至少包含 8 位数字，只允许数字、空格、+ - ( )
pub fn normalize_phone(phone: Option<&str>) -> AppResult<Option<String>> {
    let Some(phone) = phone.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(None);
    };

    let phone_regex = Regex::new(r"^\+?[\d\s\-()]+$")
        .map_err(|e| AppError::InternalError(format!("Invalid phone pattern: {e}")))?;
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();

    if !phone_regex.is_match(phone) || digits < 8 {
        return Err(AppError::ValidationError(
            "Invalid phone number".to_string(),
        ));
    }

    Ok(Some(phone.to_string()))
}
