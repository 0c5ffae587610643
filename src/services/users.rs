use async_trait::async_trait;
use sled::Db;
use tokio::sync::oneshot;

use super::{RequestHandler, Service, ServiceError};
use crate::models::users::User;
use crate::repositories::users::UserRepository;

pub enum UserRequest {
    ListUsers {
        search: Option<String>,
        response: oneshot::Sender<Result<Vec<User>, ServiceError>>,
    },
    SetBalance {
        mobile: String,
        amount: f64,
        response: oneshot::Sender<Result<User, ServiceError>>,
    },
    SetBlocked {
        mobile: String,
        blocked: bool,
        response: oneshot::Sender<Result<User, ServiceError>>,
    },
    DeleteUser {
        mobile: String,
        response: oneshot::Sender<Result<(), ServiceError>>,
    },
}

#[derive(Clone)]
pub struct UserRequestHandler {
    repository: UserRepository,
}

impl UserRequestHandler {
    pub fn new(db: &Db) -> Result<Self, anyhow::Error> {
        let repository = UserRepository::new(db)?;

        Ok(UserRequestHandler { repository })
    }

    async fn list_users(&self, search: Option<String>) -> Result<Vec<User>, ServiceError> {
        let mut users = self
            .repository
            .list_users()
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        if let Some(needle) = search {
            let needle = needle.to_lowercase();
            users.retain(|user| {
                user.mobile.to_lowercase().contains(&needle)
                    || user
                        .name
                        .as_deref()
                        .map(|name| name.to_lowercase().contains(&needle))
                        .unwrap_or(false)
            });
        }
        users.sort_by(|a, b| a.mobile.cmp(&b.mobile));
        Ok(users)
    }

    fn require_user(&self, mobile: &str) -> Result<User, ServiceError> {
        self.repository
            .get_user_by_mobile(mobile)
            .map_err(|e| ServiceError::Database(e.to_string()))?
            .ok_or(ServiceError::NotFound)
    }

    /// Operator-entered absolute overwrite. Two admins writing concurrently
    /// race under last-write-wins; that is the documented policy.
    async fn set_balance(&self, mobile: &str, amount: f64) -> Result<User, ServiceError> {
        self.require_user(mobile)?;
        self.repository
            .set_balance(mobile, amount)
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    /// Blocking takes effect at the next manual login attempt; an existing
    /// session is not torn down.
    async fn set_blocked(&self, mobile: &str, blocked: bool) -> Result<User, ServiceError> {
        self.require_user(mobile)?;
        self.repository
            .set_blocked(mobile, blocked)
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    /// Irreversible; the user's transactions are left orphaned on purpose.
    async fn delete_user(&self, mobile: &str) -> Result<(), ServiceError> {
        self.require_user(mobile)?;
        self.repository
            .delete_user(mobile)
            .map_err(|e| ServiceError::Database(e.to_string()))
    }
}

#[async_trait]
impl RequestHandler<UserRequest> for UserRequestHandler {
    async fn handle_request(&self, request: UserRequest) {
        match request {
            UserRequest::ListUsers { search, response } => {
                let users = self.list_users(search).await;
                let _ = response.send(users);
            }
            UserRequest::SetBalance {
                mobile,
                amount,
                response,
            } => {
                let result = self.set_balance(&mobile, amount).await;
                let _ = response.send(result);
            }
            UserRequest::SetBlocked {
                mobile,
                blocked,
                response,
            } => {
                let result = self.set_blocked(&mobile, blocked).await;
                let _ = response.send(result);
            }
            UserRequest::DeleteUser { mobile, response } => {
                let result = self.delete_user(&mobile).await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct UserService;

impl UserService {
    pub fn new() -> Self {
        UserService {}
    }
}

#[async_trait]
impl Service<UserRequest, UserRequestHandler> for UserService {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::{AccountType, KycStatus};

    fn handler() -> (tempfile::TempDir, UserRequestHandler) {
        let dir = tempfile::tempdir().unwrap();
        let db = sled::open(dir.path()).unwrap();
        let handler = UserRequestHandler::new(&db).unwrap();
        (dir, handler)
    }

    fn user(mobile: &str, name: &str) -> User {
        User {
            id: mobile.to_string(),
            mobile: mobile.to_string(),
            email: String::new(),
            name: Some(name.to_string()),
            pin: "1234".to_string(),
            balance: 0.0,
            account_type: AccountType::Normal,
            refer_code: None,
            device_id: "DEV-1".to_string(),
            is_blocked: false,
            kyc_status: KycStatus::None,
            telegram_id: None,
        }
    }

    #[tokio::test]
    async fn set_balance_shows_exact_overwrite_in_listing() {
        let (_dir, handler) = handler();
        handler
            .repository
            .insert_user(&user("01700000000", "Abir"))
            .unwrap();

        handler.set_balance("01700000000", 750.0).await.unwrap();
        let users = handler.list_users(None).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].balance, 750.0);
    }

    #[tokio::test]
    async fn search_matches_name_or_mobile_substring() {
        let (_dir, handler) = handler();
        handler
            .repository
            .insert_user(&user("01700000000", "Abir Hasan"))
            .unwrap();
        handler
            .repository
            .insert_user(&user("01800000000", "Sumon Ali"))
            .unwrap();

        let by_name = handler.list_users(Some("abir".to_string())).await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].mobile, "01700000000");

        let by_mobile = handler.list_users(Some("018".to_string())).await.unwrap();
        assert_eq!(by_mobile.len(), 1);
        assert_eq!(by_mobile[0].name.as_deref(), Some("Sumon Ali"));
    }

    #[tokio::test]
    async fn delete_removes_from_listing_and_missing_user_is_not_found() {
        let (_dir, handler) = handler();
        handler
            .repository
            .insert_user(&user("01700000000", "Abir"))
            .unwrap();

        handler.delete_user("01700000000").await.unwrap();
        assert!(handler.list_users(None).await.unwrap().is_empty());

        assert!(matches!(
            handler.delete_user("01700000000").await,
            Err(ServiceError::NotFound)
        ));
        assert!(matches!(
            handler.set_balance("01700000000", 1.0).await,
            Err(ServiceError::NotFound)
        ));
    }
}
