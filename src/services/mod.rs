pub mod admin_service;
pub mod dashboard_service;
pub mod draw_service;
pub mod identity_service;
pub mod redemption_service;
pub mod submission_service;

pub use admin_service::*;
pub use dashboard_service::*;
pub use draw_service::*;
pub use identity_service::*;
pub use redemption_service::*;
pub use submission_service::*;
