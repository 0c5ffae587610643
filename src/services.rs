use async_trait::async_trait;
use sled::Db;
use tokio::sync::mpsc;

use crate::session::SessionStore;
use crate::settings::Settings;

pub mod auth;
pub mod catalog;
pub mod http;
pub mod notifications;
pub mod transactions;
pub mod users;

/// Every user-visible failure mode of the system. Store-write failures are
/// fatal to the interaction that caused them; notification failures never
/// surface here at all (the notifier absorbs them).
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("No account exists for this number")]
    NotFound,
    #[error("Wrong pin")]
    InvalidCredential,
    #[error("This account has been blocked")]
    Blocked,
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Communication error: {0} - {1}")]
    Communication(String, String),
}

#[async_trait]
pub trait RequestHandler<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    async fn handle_request(&self, request: T);
}

#[async_trait]
pub trait Service<T, H>: Send + Sync + 'static
where
    T: Send + 'static,
    H: RequestHandler<T> + Clone + Send,
{
    async fn run(&mut self, handler: H, receiver: &mut mpsc::Receiver<T>) {
        while let Some(request) = receiver.recv().await {
            let handler = handler.clone();

            tokio::spawn(async move {
                handler.handle_request(request).await;
            });
        }
    }
}

pub async fn start_services(db: Db, settings: Settings) -> Result<(), anyhow::Error> {
    let (notifier_tx, mut notifier_rx) = mpsc::channel(512);
    let (auth_tx, mut auth_rx) = mpsc::channel(512);
    let (user_tx, mut user_rx) = mpsc::channel(512);
    let (transaction_tx, mut transaction_rx) = mpsc::channel(512);
    let (catalog_tx, mut catalog_rx) = mpsc::channel(512);

    let session = SessionStore::new(&db)?;

    log::info!("Starting notifier service.");
    let mut notifier_service = notifications::NotifierService::new();
    let notifier_settings = settings.telegram.clone();
    tokio::spawn(async move {
        let handler = notifications::TelegramNotifier::new(
            notifier_settings.bot_token,
            notifier_settings.chat_id,
        );
        notifier_service.run(handler, &mut notifier_rx).await;
    });

    log::info!("Starting auth service.");
    let mut auth_service = auth::AuthService::new();
    let auth_handler = auth::AuthRequestHandler::new(
        &db,
        session.clone(),
        notifier_tx.clone(),
        settings.admin.clone(),
    )?;
    tokio::spawn(async move {
        auth_service.run(auth_handler, &mut auth_rx).await;
    });

    log::info!("Starting user service.");
    let mut user_service = users::UserService::new();
    let user_handler = users::UserRequestHandler::new(&db)?;
    tokio::spawn(async move {
        user_service.run(user_handler, &mut user_rx).await;
    });

    log::info!("Starting transaction service.");
    let mut transaction_service = transactions::TransactionService::new();
    let transaction_handler =
        transactions::TransactionRequestHandler::new(&db, notifier_tx.clone())?;
    tokio::spawn(async move {
        transaction_service
            .run(transaction_handler, &mut transaction_rx)
            .await;
    });

    log::info!("Starting catalog service.");
    let mut catalog_service = catalog::CatalogService::new();
    let catalog_handler = catalog::CatalogRequestHandler::new(&db)?;
    tokio::spawn(async move {
        catalog_service.run(catalog_handler, &mut catalog_rx).await;
    });

    // Restore the persisted session before taking traffic. No host identity is
    // available in the standalone binary; the embedded path comes in over HTTP.
    let session_users = crate::repositories::users::UserRepository::new(&db)?;
    session.restore(None, &session_users, &notifier_tx).await;

    log::info!("Starting HTTP server on {}.", settings.server.bind);
    let state = http::AppState {
        auth_channel: auth_tx,
        user_channel: user_tx,
        transaction_channel: transaction_tx,
        catalog_channel: catalog_tx,
        session,
    };
    http::start_http_server(&settings.server.bind, state).await?;

    Ok(())
}
