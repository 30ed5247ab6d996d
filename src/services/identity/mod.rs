pub mod claims;
pub mod hosted;
pub mod provider;
pub mod session_jwt;

pub use claims::{Role, SessionClaims, UnknownRole};
pub use hosted::HostedIdentityProvider;
pub use provider::{ClaimsError, IdentityError, IdentityProvider, UserRecord};
pub use session_jwt::{SessionKey, SessionVerifier};
