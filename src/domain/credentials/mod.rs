//! Credential resolution domain

mod builder;
mod credential;
mod holder;
mod properties;

pub use builder::{ensure_valid, CredentialsBuilder};
pub use credential::{mask_key, CredentialData};
pub use holder::{CredentialsHolder, CredentialsRefresher, HolderState, IssuedCredentials};
pub use properties::{credentials_types, keys, ConnectionProperties, InvalidProperty};
