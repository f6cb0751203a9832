pub mod code_generator;
pub mod contact;
pub mod jwt;
pub mod mask;
pub mod password;

pub use code_generator::{
    REDEEM_CODE_ALPHABET, REDEEM_CODE_LENGTH, generate_redeem_code, normalize_redeem_code,
};
pub use contact::{normalize_phone, validate_email};
pub use jwt::*;
pub use mask::{mask_email, mask_phone};
pub use password::*;
