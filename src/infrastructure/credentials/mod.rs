//! Credentials builders, the registry that selects them and the holder cache

mod assumed_role;
mod cached_holder;
mod external_id;
mod factory;
pub mod params;
mod session;
mod static_keys;

pub use assumed_role::{AssumedRoleBuilder, DEFAULT_ROLE_SESSION_NAME};
pub use cached_holder::CredentialsHolderCache;
pub use external_id::ExternalIdGenerator;
pub use factory::{CredentialsFactory, CredentialsFactoryBuilder};
pub use params::{StsEndpointPolicy, StsSettings};
pub use session::SessionCredentialsBuilder;
pub use static_keys::StaticKeysBuilder;
