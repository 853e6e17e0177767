//! Infrastructure Layer
//!
//! Database implementations and external service integrations.

pub mod memory;
pub mod oauth_gateway;
pub mod postgres;
pub mod smtp;

pub use oauth_gateway::{HttpProviderGateway, ProviderGateway, ProviderSettings};
pub use postgres::PgIdentityRepository;
pub use smtp::SmtpMailer;
