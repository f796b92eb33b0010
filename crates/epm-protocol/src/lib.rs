//! EPM Protocol - data model for LLM endpoint profiles
//!
//! This crate defines the types shared by the profile store, the profile
//! manager and any front end:
//!
//! - [`Provider`] - the closed set of supported LLM providers
//! - [`Field`] / [`fields_of`] - the static per-provider field schema
//! - [`Credentials`] - one provider's fields, as a sum type
//! - [`SecretValue`] - redacted holder for keys and secrets
//! - [`Profile`] - a named, stored snapshot of one provider's credentials
//! - [`AccessConfig`] - the live credential record
//! - [`AppConfig`] - application settings touched by profile switching
//!
//! # Example
//!
//! ```rust
//! use epm_protocol::{Credentials, Field, Profile, Provider};
//!
//! let mut credentials = Credentials::empty(Provider::Azure);
//! credentials.set(Field::AzureApiKey, "az-1");
//!
//! let profile = Profile::new("id-1", "prod", credentials);
//! let json = serde_json::to_value(&profile).unwrap();
//! assert_eq!(json["provider"], "Azure");
//! assert_eq!(json["azureApiKey"], "az-1");
//! ```

#![warn(missing_docs)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

pub mod credentials;
/// Providers, profiles and configuration records
pub mod models;
pub mod schema;
pub mod secret;

pub use credentials::*;
pub use models::*;
pub use schema::*;
pub use secret::SecretValue;

pub use secrecy::ExposeSecret;

/// JSON schema of the stored profile list.
pub fn profile_list_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(Vec<Profile>)
}
