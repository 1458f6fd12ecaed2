mod policy;
mod tokens;

pub use policy::{AuthorizationPolicy, Capability, Principal};
pub use tokens::{token_expiry, TokenAction, TokenService};
