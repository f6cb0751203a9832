//! 大屏展示时的隐私遮罩

/// `ana@example.com` -> `a***@example.com`
pub fn mask_email(email: &str) -> String {
    if email.is_empty() {
        return "N/A".to_string();
    }
    match email.split_once('@') {
        Some((local, domain)) if !domain.is_empty() => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{first}***@{domain}")
        }
        _ => "***@***".to_string(),
    }
}

/// 只保留最后 4 位数字: `(***) ***-4321`
pub fn mask_phone(phone: &str) -> String {
    if phone.is_empty() {
        return "N/A".to_string();
    }
    let digits: Vec<char> = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        return "***".to_string();
    }
    let last_four: String = digits[digits.len() - 4..].iter().collect();
    format!("(***) ***-{last_four}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("ana@example.com"), "a***@example.com");
        assert_eq!(mask_email("@example.com"), "***@example.com");
        assert_eq!(mask_email("no-domain"), "***@***");
        assert_eq!(mask_email(""), "N/A");
    }

    #[test]
    fn test_mask_phone() {
        assert_eq!(mask_phone("(11) 98765-4321"), "(***) ***-4321");
        assert_eq!(mask_phone("12"), "***");
        assert_eq!(mask_phone(""), "N/A");
    }
}
