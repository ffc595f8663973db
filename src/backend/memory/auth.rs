use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::watch;
use uuid::Uuid;

use crate::backend::{AuthProvider, User};
use crate::error::AuthError;
use crate::utils::{hash_password, is_valid_email, verify_password};

const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    user: User,
    password_hash: String,
}

/// 进程内的认证服务，密码以 bcrypt 保存
pub struct MemoryAuth {
    accounts: Mutex<HashMap<String, Account>>,
    current: watch::Sender<Option<User>>,
    hash_cost: u32,
}

impl MemoryAuth {
    pub fn new(hash_cost: u32) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            current,
            hash_cost,
        }
    }

    pub fn current_user(&self) -> Option<User> {
        self.current.borrow().clone()
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    async fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            });
        }

        let password_hash = hash_password(password, self.hash_cost)
            .map_err(|e| AuthError::Provider(format!("Failed to hash password: {}", e)))?;

        let user = {
            let mut accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
            if accounts.contains_key(&email) {
                return Err(AuthError::EmailAlreadyInUse);
            }
            let user = User {
                id: Uuid::new_v4().to_string(),
                email: email.clone(),
            };
            accounts.insert(
                email,
                Account {
                    user: user.clone(),
                    password_hash,
                },
            );
            user
        };

        // 注册成功即视为登录
        tracing::info!("Registered user: {}", user.id);
        self.current.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(AuthError::InvalidEmail);
        }

        let (user, password_hash) = {
            let accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
            let account = accounts.get(&email).ok_or(AuthError::UserNotFound)?;
            (account.user.clone(), account.password_hash.clone())
        };

        let valid = verify_password(password, &password_hash)
            .map_err(|e| AuthError::Provider(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(AuthError::WrongPassword);
        }

        tracing::info!("Signed in user: {}", user.id);
        self.current.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(user) = self.current.send_replace(None) {
            tracing::info!("Signed out user: {}", user.id);
        }
        Ok(())
    }

    fn auth_state(&self) -> watch::Receiver<Option<User>> {
        self.current.subscribe()
    }
}
