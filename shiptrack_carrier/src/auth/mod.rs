mod provider;
mod types;

pub use provider::{AuthProvider, OAuthProvider};
pub use types::Credential;
