pub mod auth;
pub mod common;
pub mod dashboard;
pub mod draw;
pub mod participant;
pub mod prize;
pub mod redemption;
pub mod submission;

pub use auth::*;
pub use common::*;
pub use dashboard::*;
pub use draw::*;
pub use participant::*;
pub use prize::*;
pub use redemption::*;
pub use submission::*;
