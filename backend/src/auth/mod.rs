pub mod jwks;
pub mod roles;

pub use jwks::{AuthError, JwksClient, Profile};
pub use roles::authorize;
