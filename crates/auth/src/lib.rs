//! `cartline-auth`: bearer-token boundary.
//!
//! Decodes and checks tokens; never issues them. Knows nothing about HTTP.

pub mod claims;
pub mod jwt;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtValidator};
