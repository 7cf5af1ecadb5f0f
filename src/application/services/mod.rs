//! Business logic services for the application layer.

pub mod otp_service;
pub mod password;
pub mod resource_service;
pub mod token_service;
pub mod user_service;

pub use otp_service::{LogOtpSender, OtpSender, OtpService, OtpSettings};
pub use resource_service::{ResourceMapping, ResourceService};
pub use token_service::{Claims, TokenDetail, TokenService, TokenType};
pub use user_service::{Registration, UserService};
