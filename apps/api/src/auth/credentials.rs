use anyhow::{anyhow, bail, Context, Result};
use argon2::{
    password_hash::{PasswordHash, PasswordVerifier},
    Argon2,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    User,
}

/// A stored login. `password_hash` is an Argon2id PHC string
/// (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialEntry {
    pub username: String,
    pub role: Role,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub username: String,
    pub role: Role,
}

/// Static credential table, loaded from configuration at startup.
#[derive(Debug, Clone, Default)]
pub struct CredentialTable {
    entries: Vec<CredentialEntry>,
}

impl CredentialTable {
    /// Rejects entries whose hash is not a parseable PHC string.
    pub fn new(entries: Vec<CredentialEntry>) -> Result<Self> {
        for entry in &entries {
            PasswordHash::new(&entry.password_hash)
                .map_err(|e| anyhow!("{e}"))
                .with_context(|| format!("Invalid password hash for user '{}'", entry.username))?;
        }
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = entries.iter().find(|e| !seen.insert(e.username.as_str())) {
            bail!("User '{}' appears more than once", dup.username);
        }
        Ok(Self { entries })
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let entries: Vec<CredentialEntry> =
            serde_json::from_str(raw).context("credential table must be a JSON array")?;
        Self::new(entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the principal when `username` exists and `password` matches.
    pub fn verify(&self, username: &str, password: &str) -> Option<Principal> {
        let username = username.trim();
        let entry = self.entries.iter().find(|e| e.username == username)?;
        let parsed = PasswordHash::new(&entry.password_hash).ok()?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Some(Principal {
                username: entry.username.clone(),
                role: entry.role,
            }),
            Err(argon2::password_hash::Error::Password) => None,
            Err(e) => {
                warn!("Password verification failed for '{}': {e}", entry.username);
                None
            }
        }
    }
}

/// Test credentials hashed with a per-user fixed salt.
#[cfg(test)]
pub(crate) fn entry(username: &str, role: Role, password: &str) -> CredentialEntry {
    use argon2::password_hash::{PasswordHasher, SaltString};

    let salt = SaltString::encode_b64(format!("salt-{username}").as_bytes()).unwrap();
    CredentialEntry {
        username: username.to_string(),
        role,
        password_hash: Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string(),
    }
}
