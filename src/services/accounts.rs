use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{AuthError, Identity, TokenAuthority};
use crate::config::BootstrapConfig;
use crate::database::models::{Account, Role};
use crate::database::AccountChanges;

use super::{required, required_name, ServiceError, ServiceResult, Storage};

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "Username", alias = "username")]
    pub username: Option<String>,
    #[serde(rename = "Password", alias = "password")]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: Account,
}

#[derive(Debug, Default, Deserialize)]
pub struct AccountInput {
    #[serde(rename = "Username", alias = "username")]
    pub username: Option<String>,
    #[serde(rename = "Password", alias = "password")]
    pub password: Option<String>,
    #[serde(rename = "Role", alias = "role")]
    pub role: Option<String>,
}

/// Login and account administration.
#[derive(Clone)]
pub struct AccountService {
    storage: Storage,
    tokens: TokenAuthority,
    // Verified against when the username is unknown
    decoy_hash: Arc<OnceCell<String>>,
}

impl AccountService {
    pub fn new(storage: Storage, tokens: TokenAuthority) -> Self {
        Self { storage, tokens, decoy_hash: Arc::new(OnceCell::new()) }
    }

    /// Unknown usernames and wrong passwords fail identically.
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<LoginResponse> {
        let username = required_name("Username", request.username.as_deref())?;
        let password = required_password(request.password)?;

        let s = &self.storage;
        let account = s
            .guard("find_account_by_username", s.store().find_account_by_username(&username))
            .await?;

        let verified = match &account {
            Some(account) => check_password(password, account.password_hash.clone()).await?,
            None => {
                let decoy = self.decoy_hash.get_or_try_init(|| hash("stockroom-decoy".to_string())).await?;
                check_password(password, decoy.clone()).await?;
                false
            }
        };
        let account = match account {
            Some(account) if verified => account,
            _ => {
                warn!("Failed login for '{}'", username);
                return Err(AuthError::InvalidCredential("invalid username or password".to_string()).into());
            }
        };

        let issued = self.tokens.issue(&account)?;
        info!("User '{}' logged in", account.username);
        Ok(LoginResponse { token: issued.token, expires_in: issued.expires_in, user: account })
    }

    pub async fn create(&self, input: AccountInput) -> ServiceResult<Account> {
        let username = required_name("Username", input.username.as_deref())?;
        let password = required_password(input.password)?;
        let role = match input.role.as_deref() {
            Some(role) => parse_role(role)?,
            None => Role::User,
        };

        let hash = hash(password).await?;
        let s = &self.storage;
        let account = s
            .guard("insert_account", s.store().insert_account(&username, &hash, role))
            .await?;
        info!("Created account {} '{}' with role {}", account.id, account.username, account.role);
        Ok(account)
    }

    pub async fn list(&self) -> ServiceResult<Vec<Account>> {
        let s = &self.storage;
        s.guard("list_accounts", s.store().list_accounts()).await
    }

    pub async fn update(&self, actor: &Identity, id: i64, input: AccountInput) -> ServiceResult<Account> {
        let username = input
            .username
            .as_deref()
            .map(|name| required_name("Username", Some(name)))
            .transpose()?;
        let role = input.role.as_deref().map(parse_role).transpose()?;
        if role.is_some_and(|role| role != Role::Manager) {
            self.ensure_manager_remains(actor, id).await?;
        }
        let password_hash = match input.password {
            Some(password) => Some(hash(required_password(Some(password))?).await?),
            None => None,
        };

        let changes = AccountChanges { username, password_hash, role };
        let s = &self.storage;
        let account = s.guard("update_account", s.store().update_account(id, &changes)).await?;
        info!("Updated account {} '{}'", account.id, account.username);
        Ok(account)
    }

    /// At least one Manager must survive a demotion, and never by demoting oneself.
    async fn ensure_manager_remains(&self, actor: &Identity, id: i64) -> ServiceResult<()> {
        if actor.subject_id == id {
            return Err(ServiceError::InvalidState("cannot demote your own account".to_string()));
        }
        let accounts = self.list().await?;
        let target_is_manager = accounts.iter().any(|a| a.id == id && a.role == Role::Manager);
        let other_managers = accounts.iter().filter(|a| a.id != id && a.role == Role::Manager).count();
        if target_is_manager && other_managers == 0 {
            return Err(ServiceError::InvalidState("cannot demote the last Manager".to_string()));
        }
        Ok(())
    }

    pub async fn delete(&self, actor: &Identity, id: i64) -> ServiceResult<()> {
        if actor.subject_id == id {
            return Err(ServiceError::InvalidState("cannot delete your own account".to_string()));
        }
        let s = &self.storage;
        s.guard("delete_account", s.store().delete_account(id)).await?;
        info!("Account {} deleted by '{}'", id, actor.username);
        Ok(())
    }

    /// Creates the configured manager account unless the username is taken.
    pub async fn ensure_bootstrap_manager(&self, bootstrap: &BootstrapConfig) -> ServiceResult<Option<Account>> {
        let (Some(username), Some(password)) = (&bootstrap.manager_username, &bootstrap.manager_password) else {
            return Ok(None);
        };

        let s = &self.storage;
        if s.guard("find_account_by_username", s.store().find_account_by_username(username))
            .await?
            .is_some()
        {
            info!("Bootstrap manager '{}' already exists", username);
            return Ok(None);
        }

        let account = self
            .create(AccountInput {
                username: Some(username.clone()),
                password: Some(password.clone()),
                role: Some(Role::Manager.to_string()),
            })
            .await?;
        Ok(Some(account))
    }
}

fn required_password(password: Option<String>) -> ServiceResult<String> {
    match required("Password", password)? {
        p if p.is_empty() => Err(ServiceError::MissingField("Password")),
        p => Ok(p),
    }
}

fn parse_role(role: &str) -> ServiceResult<Role> {
    role.parse::<Role>().map_err(|e| ServiceError::OutOfRange(e.to_string()))
}

// Argon2 is CPU bound; keep it off the async workers.
async fn hash(password: String) -> ServiceResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ServiceError::Internal(format!("hashing task failed: {}", e)))?
        .map_err(|e| ServiceError::Internal(format!("password hashing failed: {}", e)))
}

async fn check_password(password: String, stored_hash: String) -> ServiceResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| ServiceError::Internal(format!("verification task failed: {}", e)))
}
