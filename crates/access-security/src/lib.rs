//! # Access Security
//! 
//! Credential session context and access-token claim inspection.

pub mod jwt;
pub mod session;

pub use jwt::{Claims, JwtError};
pub use session::CredentialSession;
