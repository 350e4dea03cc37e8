/// Account signup and login backed by the credential index
use serde_json::Value;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::UserDocument;
use crate::security::{hash_password_blocking, verify_password_blocking, JwtKeys};
use crate::services::elasticsearch::SearchIndex;

const USER_DOC_TYPE: &str = "user";

#[derive(Clone)]
pub struct AccountService {
    index: Arc<dyn SearchIndex>,
    user_index: String,
    keys: JwtKeys,
}

impl AccountService {
    pub fn new(index: Arc<dyn SearchIndex>, user_index: impl Into<String>, keys: JwtKeys) -> Self {
        Self {
            index,
            user_index: user_index.into(),
            keys,
        }
    }

    /// Register a new user. The document id is the username.
    ///
    /// Two concurrent signups for the same name can both pass the lookup;
    /// the later write wins.
    pub async fn signup(&self, username: &str, password: &str) -> Result<()> {
        if username.is_empty() || password.is_empty() {
            return Err(AppError::EmptyCredential);
        }

        if !self.lookup(username).await?.is_empty() {
            tracing::info!(username = %username, "Signup rejected: username taken");
            return Err(AppError::DuplicateUsername(username.to_string()));
        }

        let document = serde_json::to_value(UserDocument {
            username: username.to_string(),
            password_hash: hash_password_blocking(password.to_string()).await?,
        })?;

        self.index
            .index_document(&self.user_index, USER_DOC_TYPE, username, &document)
            .await?;

        tracing::info!(username = %username, "User added");
        Ok(())
    }

    /// Check a credential pair and issue a token for it.
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        if username.is_empty() || password.is_empty() {
            return Err(AppError::InvalidCredentials);
        }

        let user: UserDocument = self
            .lookup(username)
            .await?
            .into_iter()
            .next()
            .and_then(|doc| serde_json::from_value(doc).ok())
            .ok_or(AppError::InvalidCredentials)?;

        let verified = user.username == username
            && verify_password_blocking(password.to_string(), user.password_hash).await?;
        if !verified {
            tracing::info!(username = %username, "Login rejected");
            return Err(AppError::InvalidCredentials);
        }

        self.keys.issue(username)
    }

    /// Credential records stored under `username`.
    ///
    /// More than one hit means the index is inconsistent; callers use the first.
    async fn lookup(&self, username: &str) -> Result<Vec<Value>> {
        let hits = self
            .index
            .query_by_exact_field(&self.user_index, "username", username)
            .await?;

        if hits.len() > 1 {
            tracing::warn!(username = %username, hits = hits.len(), "Duplicate credential records");
        }

        Ok(hits)
    }
}
