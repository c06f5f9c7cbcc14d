//! `innkeep-auth` — authentication/authorization boundary.
//!
//! Token issuance and verification, credential checks, and the path-prefix
//! access policy. This crate is decoupled from HTTP and storage: callers
//! provide a [`CredentialStore`] and feed request paths in.

pub mod claims;
pub mod credentials;
pub mod error;
pub mod policy;
pub mod principal;
pub mod roles;
pub mod token;

pub use claims::{TokenClaims, validate_claims};
pub use credentials::{
    Authenticator, Credential, CredentialStore, PasswordHash, normalize_identifier, validate_identifier,
    validate_secret,
};
pub use error::AuthError;
pub use policy::{AccessPolicy, AccessRule, Allowed, PolicyError, Requirement};
pub use principal::Principal;
pub use roles::Role;
pub use token::{Hs256JwtValidator, IssuedToken, JwtValidator, SigningSecret, TokenIssuer};
