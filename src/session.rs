use std::sync::Arc;

use sled::Db;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::models::telegram::TelegramIdentity;
use crate::models::users::{AccountType, KycStatus, User};
use crate::repositories::session::SessionRepository;
use crate::repositories::users::UserRepository;
use crate::services::notifications::{format_registration_msg, NotifierRequest};

/// Pin assigned to accounts auto-created through the embedded-host login path.
const AUTO_LOGIN_DEFAULT_PIN: &str = "0000";

#[derive(Clone, Debug, Default)]
pub struct SessionState {
    pub user: Option<User>,
    pub is_admin: bool,
}

/// The one holder of "who is using the app right now". All mutation goes
/// through `set_user`/`set_admin`; consumers observe changes via `subscribe`.
/// Persisted state is the source of truth only at startup (`restore`); from
/// then on the in-memory copy is authoritative.
#[derive(Clone)]
pub struct SessionStore {
    repository: SessionRepository,
    state: Arc<watch::Sender<SessionState>>,
}

impl SessionStore {
    pub fn new(db: &Db) -> Result<Self, anyhow::Error> {
        let repository = SessionRepository::new(db)?;
        let (state, _) = watch::channel(SessionState::default());

        Ok(SessionStore {
            repository,
            state: Arc::new(state),
        })
    }

    /// Startup path. A host-provided identity takes precedence over the
    /// persisted record; any failure along the auto-login path is logged and
    /// swallowed, leaving the session to fall back exactly as if no identity
    /// had been present.
    pub async fn restore(
        &self,
        identity: Option<TelegramIdentity>,
        users: &UserRepository,
        notifier: &mpsc::Sender<NotifierRequest>,
    ) -> Option<User> {
        if let Some(identity) = identity {
            match self.auto_login(&identity, users, notifier).await {
                Ok(user) => {
                    self.set_user(Some(user.clone()));
                    return Some(user);
                }
                Err(e) => {
                    log::error!("Telegram auto-login failed, falling back: {}", e);
                }
            }
        }

        let user = match self.repository.load_user() {
            Ok(user) => user,
            Err(e) => {
                log::error!("Could not restore persisted session: {}", e);
                None
            }
        };
        let is_admin = self.repository.load_admin().unwrap_or(false);

        self.state.send_replace(SessionState {
            user: user.clone(),
            is_admin,
        });
        user
    }

    async fn auto_login(
        &self,
        identity: &TelegramIdentity,
        users: &UserRepository,
        notifier: &mpsc::Sender<NotifierRequest>,
    ) -> Result<User, anyhow::Error> {
        if let Some(user) = users.find_by_telegram_id(identity.id)? {
            return Ok(user);
        }

        let user = User {
            id: new_user_id(),
            mobile: format!("tg:{}", identity.id),
            email: String::new(),
            name: Some(identity.display_name()),
            pin: AUTO_LOGIN_DEFAULT_PIN.to_string(),
            balance: 0.0,
            account_type: AccountType::Normal,
            refer_code: None,
            device_id: new_device_id(),
            is_blocked: false,
            kyc_status: KycStatus::None,
            telegram_id: Some(identity.id),
        };
        users.insert_user(&user)?;

        let alert = NotifierRequest::AdminAlert {
            text: format_registration_msg(&user),
        };
        if notifier.send(alert).await.is_err() {
            log::error!("Notifier queue closed; registration alert dropped");
        }

        Ok(user)
    }

    /// Single mutation entry point for the authenticated user. Clearing the
    /// user also clears the persisted copy. Persistence failures are logged;
    /// the in-memory state still moves.
    pub fn set_user(&self, user: Option<User>) {
        if let Err(e) = self.repository.save_user(user.as_ref()) {
            log::error!("Could not persist session user: {}", e);
        }
        self.state.send_modify(|state| state.user = user);
    }

    pub fn set_admin(&self, is_admin: bool) {
        if let Err(e) = self.repository.save_admin(is_admin) {
            log::error!("Could not persist admin flag: {}", e);
        }
        self.state.send_modify(|state| state.is_admin = is_admin);
    }

    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

pub fn new_user_id() -> String {
    Uuid::new_v4().simple().to_string()[..9].to_uppercase()
}

pub fn new_device_id() -> String {
    format!(
        "DEV-{}",
        Uuid::new_v4().simple().to_string()[..6].to_uppercase()
    )
}
