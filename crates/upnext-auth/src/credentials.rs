//! Client identity loading.
//!
//! Google Cloud Console exports an application secret as a JSON blob keyed
//! by application type. Both the desktop (`installed`) and `web` shapes are
//! accepted; the file is read once per run from the working directory.

use serde::Deserialize;
use std::path::Path;

use crate::error::AuthError;

/// Expected location of the application secret, relative to the working
/// directory.
pub const CLIENT_SECRET_FILE: &str = "client_secret.json";

/// Manual copy/paste redirect, used when the secret lists no redirect URIs.
const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

fn default_auth_uri() -> String {
    crate::google::GOOGLE_AUTH_URL.to_string()
}

fn default_token_uri() -> String {
    crate::google::GOOGLE_TOKEN_URL.to_string()
}

/// One application entry of the client secret file.
#[derive(Debug, Clone, Deserialize)]
pub struct InstalledSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

impl InstalledSecret {
    /// The redirect URI sent with the consent URL and the code exchange.
    pub fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or(OOB_REDIRECT_URI)
    }
}

/// The client secret file as downloaded from the console.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub installed: Option<InstalledSecret>,
    pub web: Option<InstalledSecret>,
}

impl ClientSecret {
    /// Read and decode the secret file. Any I/O or decode error propagates;
    /// the caller treats it as fatal.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AuthError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// The application entry, whichever shape the console exported.
    pub fn app_secret(&self) -> Result<&InstalledSecret, AuthError> {
        self.installed
            .as_ref()
            .or(self.web.as_ref())
            .ok_or(AuthError::MissingAppSecret)
    }
}
