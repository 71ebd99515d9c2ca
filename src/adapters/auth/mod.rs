//! Authentication adapters.
//!
//! Implementations of the credential ports:
//!
//! - `Argon2PasswordHasher` - `PasswordHasher` backed by Argon2id
//! - `JwtTokenIssuer` - `TokenIssuer` issuing HS256 access tokens

mod jwt;
mod password;

pub use jwt::JwtTokenIssuer;
pub use password::Argon2PasswordHasher;
