//! `lendgate-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it owns the role
//! tiers, the user entity and its tier transitions, the signup role policy, and
//! the credential/token primitives the API layer plugs into.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod password;
pub mod principal;
pub mod registration;
pub mod roles;
pub mod user;

pub use authorize::{AuthzError, authorize, require_privileged};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256Jwt, JwtValidator, TokenError, TokenIssuer};
pub use password::{PasswordError, hash_password, verify_password};
pub use principal::Principal;
pub use registration::RegistrationPolicy;
pub use roles::Role;
pub use user::{DeletionPolicy, User, normalize_email};
