//! Static credential store, provisioned from configuration at startup.

use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, info, instrument};

use crate::{
    auth::password,
    config::AuthConfig,
    errors::{Error, Result},
};

/// An account that may log in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credential {
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Argon2 PHC string
    pub hashed_password: String,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    by_username: HashMap<String, Arc<Credential>>,
}

impl CredentialStore {
    pub fn new(credentials: impl IntoIterator<Item = Credential>) -> Self {
        Self {
            by_username: credentials
                .into_iter()
                .map(|credential| (credential.username.clone(), Arc::new(credential)))
                .collect(),
        }
    }

    /// Build the store from configured accounts plus the optional bootstrap admin.
    ///
    /// The admin password is given in clear text and hashed here, once.
    pub fn from_config(auth: &AuthConfig) -> Result<Self> {
        let mut credentials = auth.users.clone();

        if let (Some(username), Some(password)) = (&auth.admin_username, &auth.admin_password) {
            credentials.push(Credential {
                username: username.clone(),
                full_name: None,
                email: None,
                hashed_password: password::hash_password(password)?,
                disabled: false,
            });
        }

        let store = Self::new(credentials);
        info!(accounts = store.len(), "Credential store loaded");
        Ok(store)
    }

    pub fn get(&self, username: &str) -> Option<Arc<Credential>> {
        self.by_username.get(username).cloned()
    }

    pub fn len(&self) -> usize {
        self.by_username.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_username.is_empty()
    }

    /// Check a username and password. Unknown users and wrong passwords fail identically.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Arc<Credential>> {
        let Some(credential) = self.get(username) else {
            debug!("Login for unknown user");
            return Err(Error::invalid_credentials());
        };

        // argon2 is CPU-bound; keep it off the async workers
        let password = password.to_string();
        let hash = credential.hashed_password.clone();
        let verified = tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
            .await
            .map_err(|e| Error::Internal {
                operation: format!("spawn password verification task: {e}"),
            })??;

        if !verified {
            debug!("Login with wrong password");
            return Err(Error::invalid_credentials());
        }
        Ok(credential)
    }
}
