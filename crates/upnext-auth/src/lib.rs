//! OAuth2 delegated authorization and token caching for upnext.
//!
//! Covers the whole pre-API stretch of a run: loading the application's
//! client secret, resolving and reading the on-disk token cache, and the
//! interactive consent flow that fills the cache on first use.

pub mod credentials;
pub mod error;
pub mod google;
pub mod token;

pub use credentials::{ClientSecret, InstalledSecret, CLIENT_SECRET_FILE};
pub use error::AuthError;
pub use google::{obtain_token, GoogleAuthorizer};
pub use token::{TokenCache, TokenSet, CACHE_PATH_ENV};
