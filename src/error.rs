use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid email address")]
    InvalidEmail,
    #[error("user not found")]
    UserNotFound,
    #[error("wrong password")]
    WrongPassword,
    #[error("email already in use")]
    EmailAlreadyInUse,
    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },
    #[error("auth provider error: {0}")]
    Provider(String),
}

impl AuthError {
    // 认证错误转换为界面提示文字
    pub fn message(&self) -> String {
        match self {
            AuthError::InvalidEmail => "Please enter a valid email address.".to_string(),
            AuthError::UserNotFound => "This email address is not registered.".to_string(),
            AuthError::WrongPassword => "The password is incorrect.".to_string(),
            AuthError::EmailAlreadyInUse => "This email address is already in use.".to_string(),
            AuthError::WeakPassword { min } => {
                format!("Password must be at least {} characters.", min)
            }
            AuthError::Provider(_) => "Authentication failed. Please try again.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("invalid object url: {0}")]
    InvalidUrl(String),
    #[error("object store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("malformed document {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl AppError {
    /// 需要弹出提示时展示给用户的文字
    pub fn notice(&self) -> String {
        match self {
            AppError::Validation(message) => message.clone(),
            AppError::Auth(e) => e.message(),
            AppError::Store(StoreError::PermissionDenied(_)) => {
                "You do not have permission to do that.".to_string()
            }
            AppError::Store(_) => "Could not reach the server. Please try again.".to_string(),
            AppError::Storage(_) => "Could not upload or remove the image.".to_string(),
            AppError::Decode { .. } => "Received unreadable data from the server.".to_string(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
