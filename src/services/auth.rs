use async_trait::async_trait;
use sled::Db;
use tokio::sync::{mpsc, oneshot};

use super::notifications::{format_registration_msg, NotifierRequest};
use super::{RequestHandler, Service, ServiceError};
use crate::models::telegram::TelegramIdentity;
use crate::models::users::{KycStatus, NewUserProfile, User};
use crate::repositories::users::UserRepository;
use crate::session::{new_device_id, new_user_id, SessionStore};
use crate::settings;

const MIN_PIN_LEN: usize = 4;

pub enum AuthRequest {
    Login {
        mobile: String,
        pin: String,
        response: oneshot::Sender<Result<User, ServiceError>>,
    },
    /// Second registration step. The OTP field is carried through but never
    /// checked against anything server-issued; only presence is required.
    Register {
        profile: NewUserProfile,
        otp: String,
        pin: String,
        confirm_pin: String,
        response: oneshot::Sender<Result<User, ServiceError>>,
    },
    TelegramLogin {
        identity: TelegramIdentity,
        response: oneshot::Sender<Option<User>>,
    },
    AdminLogin {
        username: String,
        password: String,
        response: oneshot::Sender<Result<(), ServiceError>>,
    },
    ChangePin {
        mobile: String,
        current_pin: String,
        new_pin: String,
        response: oneshot::Sender<Result<User, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct AuthRequestHandler {
    repository: UserRepository,
    session: SessionStore,
    notifier_channel: mpsc::Sender<NotifierRequest>,
    admin: settings::Admin,
}

impl AuthRequestHandler {
    pub fn new(
        db: &Db,
        session: SessionStore,
        notifier_channel: mpsc::Sender<NotifierRequest>,
        admin: settings::Admin,
    ) -> Result<Self, anyhow::Error> {
        let repository = UserRepository::new(db)?;

        Ok(AuthRequestHandler {
            repository,
            session,
            notifier_channel,
            admin,
        })
    }

    async fn login(&self, mobile: &str, pin: &str) -> Result<User, ServiceError> {
        let user = self
            .repository
            .get_user_by_mobile(mobile)
            .map_err(|e| ServiceError::Database(e.to_string()))?
            .ok_or(ServiceError::NotFound)?;

        // Pin is checked before the block flag.
        if user.pin != pin {
            return Err(ServiceError::InvalidCredential);
        }
        if user.is_blocked {
            return Err(ServiceError::Blocked);
        }

        self.session.set_user(Some(user.clone()));
        Ok(user)
    }

    async fn register(
        &self,
        profile: NewUserProfile,
        otp: &str,
        pin: &str,
        confirm_pin: &str,
    ) -> Result<User, ServiceError> {
        if profile.mobile.trim().is_empty() || profile.email.trim().is_empty() {
            return Err(ServiceError::Validation(
                "Mobile number and email are required".to_string(),
            ));
        }
        // The OTP is only required to be present; its value is accepted as-is.
        if otp.trim().is_empty() {
            return Err(ServiceError::Validation("OTP code is required".to_string()));
        }
        if pin.chars().count() < MIN_PIN_LEN {
            return Err(ServiceError::Validation(
                "Pin must be at least 4 digits".to_string(),
            ));
        }
        if pin != confirm_pin {
            return Err(ServiceError::Validation("Pins do not match".to_string()));
        }
        if self
            .repository
            .get_user_by_mobile(&profile.mobile)
            .map_err(|e| ServiceError::Database(e.to_string()))?
            .is_some()
        {
            return Err(ServiceError::Validation(
                "An account already exists for this number".to_string(),
            ));
        }

        let user = User {
            id: new_user_id(),
            mobile: profile.mobile,
            email: profile.email,
            name: profile.name,
            pin: pin.to_string(),
            balance: 0.0,
            account_type: profile.account_type,
            refer_code: profile.refer_code,
            device_id: new_device_id(),
            is_blocked: false,
            kyc_status: KycStatus::None,
            telegram_id: None,
        };
        self.repository
            .insert_user(&user)
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        // Queued after the committed write; a dead queue cannot undo it.
        let alert = NotifierRequest::AdminAlert {
            text: format_registration_msg(&user),
        };
        if self.notifier_channel.send(alert).await.is_err() {
            log::error!("Notifier queue closed; registration alert dropped");
        }

        self.session.set_user(Some(user.clone()));
        Ok(user)
    }

    async fn telegram_login(&self, identity: TelegramIdentity) -> Option<User> {
        self.session
            .restore(Some(identity), &self.repository, &self.notifier_channel)
            .await
    }

    async fn admin_login(&self, username: &str, password: &str) -> Result<(), ServiceError> {
        // Static credential comparison against the configured pair.
        if username != self.admin.username || password != self.admin.password {
            return Err(ServiceError::InvalidCredential);
        }
        self.session.set_admin(true);
        Ok(())
    }

    async fn change_pin(
        &self,
        mobile: &str,
        current_pin: &str,
        new_pin: &str,
    ) -> Result<User, ServiceError> {
        let user = self
            .repository
            .get_user_by_mobile(mobile)
            .map_err(|e| ServiceError::Database(e.to_string()))?
            .ok_or(ServiceError::NotFound)?;

        if user.pin != current_pin {
            return Err(ServiceError::InvalidCredential);
        }
        if new_pin.chars().count() < MIN_PIN_LEN {
            return Err(ServiceError::Validation(
                "Pin must be at least 4 digits".to_string(),
            ));
        }

        let updated = self
            .repository
            .set_pin(mobile, new_pin)
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        // Keep an active session for this account in step with the store.
        if let Some(current) = self.session.current().user {
            if current.mobile == updated.mobile {
                self.session.set_user(Some(updated.clone()));
            }
        }
        Ok(updated)
    }
}

#[async_trait]
impl RequestHandler<AuthRequest> for AuthRequestHandler {
    async fn handle_request(&self, request: AuthRequest) {
        match request {
            AuthRequest::Login {
                mobile,
                pin,
                response,
            } => {
                let result = self.login(&mobile, &pin).await;
                let _ = response.send(result);
            }
            AuthRequest::Register {
                profile,
                otp,
                pin,
                confirm_pin,
                response,
            } => {
                let result = self.register(profile, &otp, &pin, &confirm_pin).await;
                let _ = response.send(result);
            }
            AuthRequest::TelegramLogin { identity, response } => {
                let user = self.telegram_login(identity).await;
                let _ = response.send(user);
            }
            AuthRequest::AdminLogin {
                username,
                password,
                response,
            } => {
                let result = self.admin_login(&username, &password).await;
                let _ = response.send(result);
            }
            AuthRequest::ChangePin {
                mobile,
                current_pin,
                new_pin,
                response,
            } => {
                let result = self.change_pin(&mobile, &current_pin, &new_pin).await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct AuthService;

impl AuthService {
    pub fn new() -> Self {
        AuthService {}
    }
}

#[async_trait]
impl Service<AuthRequest, AuthRequestHandler> for AuthService {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::AccountType;

    fn handler() -> (
        tempfile::TempDir,
        AuthRequestHandler,
        mpsc::Receiver<NotifierRequest>,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let db = sled::open(dir.path()).unwrap();
        let session = SessionStore::new(&db).unwrap();
        let (notifier_tx, notifier_rx) = mpsc::channel(8);
        let admin = settings::Admin {
            username: "admin".to_string(),
            password: "admin".to_string(),
        };
        let handler = AuthRequestHandler::new(&db, session, notifier_tx, admin).unwrap();
        (dir, handler, notifier_rx)
    }

    fn profile(mobile: &str) -> NewUserProfile {
        NewUserProfile {
            mobile: mobile.to_string(),
            email: "abir@example.com".to_string(),
            name: Some("Abir Hasan".to_string()),
            refer_code: None,
            account_type: AccountType::Normal,
        }
    }

    #[tokio::test]
    async fn register_then_login_round_trips_identical_record() {
        let (_dir, handler, mut notifier_rx) = handler();

        let registered = handler
            .register(profile("01700000000"), "123456", "4321", "4321")
            .await
            .unwrap();
        let logged_in = handler.login("01700000000", "4321").await.unwrap();
        assert_eq!(registered, logged_in);

        let NotifierRequest::AdminAlert { text } = notifier_rx.recv().await.unwrap();
        assert!(text.contains("01700000000"));
    }

    #[tokio::test]
    async fn login_failures_do_not_touch_session() {
        let (_dir, handler, _rx) = handler();
        handler
            .register(profile("01700000000"), "123456", "4321", "4321")
            .await
            .unwrap();
        handler.session.set_user(None);

        assert!(matches!(
            handler.login("01999999999", "4321").await,
            Err(ServiceError::NotFound)
        ));
        assert!(matches!(
            handler.login("01700000000", "0000").await,
            Err(ServiceError::InvalidCredential)
        ));
        assert!(handler.session.current().user.is_none());
    }

    #[tokio::test]
    async fn blocked_account_rejected_even_with_correct_pin() {
        let (_dir, handler, _rx) = handler();
        handler
            .register(profile("01700000000"), "123456", "4321", "4321")
            .await
            .unwrap();
        handler.repository.set_blocked("01700000000", true).unwrap();

        assert!(matches!(
            handler.login("01700000000", "4321").await,
            Err(ServiceError::Blocked)
        ));

        handler
            .repository
            .set_blocked("01700000000", false)
            .unwrap();
        let user = handler.login("01700000000", "4321").await.unwrap();
        assert_eq!(user.pin, "4321");
        assert_eq!(user.balance, 0.0);
    }

    #[tokio::test]
    async fn register_validates_pin_rules_but_not_otp_value() {
        let (_dir, handler, _rx) = handler();

        assert!(matches!(
            handler
                .register(profile("01700000000"), "123456", "12", "12")
                .await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            handler
                .register(profile("01700000000"), "123456", "4321", "9999")
                .await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            handler
                .register(profile("01700000000"), "", "4321", "4321")
                .await,
            Err(ServiceError::Validation(_))
        ));

        // Any non-empty OTP passes; nothing checks its value.
        assert!(handler
            .register(profile("01700000000"), "garbage", "4321", "4321")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let (_dir, handler, _rx) = handler();
        handler
            .register(profile("01700000000"), "123456", "4321", "4321")
            .await
            .unwrap();

        assert!(matches!(
            handler
                .register(profile("01700000000"), "123456", "5678", "5678")
                .await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn admin_login_is_a_static_credential_check() {
        let (_dir, handler, _rx) = handler();

        assert!(matches!(
            handler.admin_login("admin", "wrong").await,
            Err(ServiceError::InvalidCredential)
        ));
        assert!(!handler.session.current().is_admin);

        handler.admin_login("admin", "admin").await.unwrap();
        assert!(handler.session.current().is_admin);
    }

    #[tokio::test]
    async fn change_pin_requires_current_pin_and_min_length() {
        let (_dir, handler, _rx) = handler();
        handler
            .register(profile("01700000000"), "123456", "4321", "4321")
            .await
            .unwrap();

        assert!(matches!(
            handler.change_pin("01700000000", "0000", "8765").await,
            Err(ServiceError::InvalidCredential)
        ));
        assert!(matches!(
            handler.change_pin("01700000000", "4321", "88").await,
            Err(ServiceError::Validation(_))
        ));

        let updated = handler.change_pin("01700000000", "4321", "8765").await.unwrap();
        assert_eq!(updated.pin, "8765");
        // The live session follows the pin change.
        assert_eq!(handler.session.current().user.unwrap().pin, "8765");
    }
}
