use async_trait::async_trait;
use sled::Db;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use super::notifications::{format_add_money_msg, format_order_msg, NotifierRequest};
use super::{RequestHandler, Service, ServiceError};
use crate::models::transactions::{
    NewAddMoney, NewServiceOrder, Transaction, TransactionKind, TransactionStatus, GUEST_USER_ID,
};
use crate::models::users::User;
use crate::repositories::transactions::TransactionRepository;

pub enum TransactionServiceRequest {
    SubmitAddMoney {
        user: Option<User>,
        request: NewAddMoney,
        response: oneshot::Sender<Result<Transaction, ServiceError>>,
    },
    SubmitServiceOrder {
        user: Option<User>,
        request: NewServiceOrder,
        response: oneshot::Sender<Result<Transaction, ServiceError>>,
    },
    ListAll {
        response: oneshot::Sender<Result<Vec<Transaction>, ServiceError>>,
    },
    ListForUser {
        user_id: String,
        response: oneshot::Sender<Result<Vec<Transaction>, ServiceError>>,
    },
    UpdateStatus {
        id: String,
        status: TransactionStatus,
        response: oneshot::Sender<Result<Transaction, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct TransactionRequestHandler {
    repository: TransactionRepository,
    notifier_channel: mpsc::Sender<NotifierRequest>,
}

impl TransactionRequestHandler {
    pub fn new(
        db: &Db,
        notifier_channel: mpsc::Sender<NotifierRequest>,
    ) -> Result<Self, anyhow::Error> {
        let repository = TransactionRepository::new(db)?;

        Ok(TransactionRequestHandler {
            repository,
            notifier_channel,
        })
    }

    /// Exactly one write, always in Pending. The alert is handed to the
    /// notifier queue after the write has committed; nothing that happens to
    /// it can roll the transaction back.
    async fn submit_add_money(
        &self,
        user: Option<User>,
        request: NewAddMoney,
    ) -> Result<Transaction, ServiceError> {
        if request.method.trim().is_empty()
            || request.sender_mobile.trim().is_empty()
            || request.payment_ref.trim().is_empty()
        {
            return Err(ServiceError::Validation(
                "Method, sender number and transaction id are required".to_string(),
            ));
        }
        if !request.amount.is_finite() || request.amount <= 0.0 {
            return Err(ServiceError::Validation(
                "Amount must be a positive number".to_string(),
            ));
        }

        let transaction = Transaction {
            id: Uuid::new_v4().hyphenated().to_string(),
            // Submissions without a session are accepted and tagged as guest.
            user_id: user
                .as_ref()
                .map(|u| u.id.clone())
                .unwrap_or_else(|| GUEST_USER_ID.to_string()),
            user_mobile: user
                .as_ref()
                .map(|u| u.mobile.clone())
                .unwrap_or_else(|| "N/A".to_string()),
            kind: TransactionKind::AddMoney,
            operator: None,
            method: Some(request.method),
            sender_mobile: Some(request.sender_mobile),
            payment_ref: Some(request.payment_ref),
            target_number: None,
            amount: request.amount,
            status: TransactionStatus::Pending,
            created_at: chrono::Utc::now(),
            description: None,
        };

        self.repository
            .insert_transaction(&transaction)
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        self.queue_alert(format_add_money_msg(&transaction));
        Ok(transaction)
    }

    async fn submit_service_order(
        &self,
        user: Option<User>,
        request: NewServiceOrder,
    ) -> Result<Transaction, ServiceError> {
        if request.kind == TransactionKind::AddMoney {
            return Err(ServiceError::Validation(
                "Add money requests use the add-money flow".to_string(),
            ));
        }
        if request.target_number.trim().is_empty() {
            return Err(ServiceError::Validation(
                "Target number is required".to_string(),
            ));
        }
        if !request.amount.is_finite() || request.amount <= 0.0 {
            return Err(ServiceError::Validation(
                "Amount must be a positive number".to_string(),
            ));
        }

        let description = request.description.unwrap_or_else(|| {
            format!(
                "{} {} for {}",
                request.operator, request.kind, request.target_number
            )
        });
        let transaction = Transaction {
            id: Uuid::new_v4().hyphenated().to_string(),
            user_id: user
                .as_ref()
                .map(|u| u.id.clone())
                .unwrap_or_else(|| GUEST_USER_ID.to_string()),
            user_mobile: user
                .as_ref()
                .map(|u| u.mobile.clone())
                .unwrap_or_else(|| "N/A".to_string()),
            kind: request.kind,
            operator: Some(request.operator),
            method: None,
            sender_mobile: None,
            payment_ref: None,
            target_number: Some(request.target_number),
            amount: request.amount,
            status: TransactionStatus::Pending,
            created_at: chrono::Utc::now(),
            description: Some(description),
        };

        self.repository
            .insert_transaction(&transaction)
            .map_err(|e| ServiceError::Database(e.to_string()))?;

        self.queue_alert(format_order_msg(&transaction));
        Ok(transaction)
    }

    fn queue_alert(&self, text: String) {
        let notifier_channel = self.notifier_channel.clone();
        tokio::spawn(async move {
            if notifier_channel
                .send(NotifierRequest::AdminAlert { text })
                .await
                .is_err()
            {
                log::error!("Notifier queue closed; admin alert dropped");
            }
        });
    }

    async fn list_all(&self) -> Result<Vec<Transaction>, ServiceError> {
        self.repository
            .list_transactions()
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Transaction>, ServiceError> {
        self.repository
            .list_transactions_for_user(user_id)
            .map_err(|e| ServiceError::Database(e.to_string()))
    }

    /// Admin resolution of a pending request. Terminal records stay terminal.
    async fn update_status(
        &self,
        id: &str,
        status: TransactionStatus,
    ) -> Result<Transaction, ServiceError> {
        let current = self
            .repository
            .get_transaction(id)
            .map_err(|e| ServiceError::Database(e.to_string()))?
            .ok_or(ServiceError::NotFound)?;

        if current.status.is_terminal() && current.status != status {
            return Err(ServiceError::Validation(format!(
                "Transaction already resolved as {:?}",
                current.status
            )));
        }

        self.repository
            .update_transaction_status(id, status)
            .map_err(|e| ServiceError::Database(e.to_string()))
    }
}

#[async_trait]
impl RequestHandler<TransactionServiceRequest> for TransactionRequestHandler {
    async fn handle_request(&self, request: TransactionServiceRequest) {
        match request {
            TransactionServiceRequest::SubmitAddMoney {
                user,
                request,
                response,
            } => {
                let result = self.submit_add_money(user, request).await;
                let _ = response.send(result);
            }
            TransactionServiceRequest::SubmitServiceOrder {
                user,
                request,
                response,
            } => {
                let result = self.submit_service_order(user, request).await;
                let _ = response.send(result);
            }
            TransactionServiceRequest::ListAll { response } => {
                let result = self.list_all().await;
                let _ = response.send(result);
            }
            TransactionServiceRequest::ListForUser { user_id, response } => {
                let result = self.list_for_user(&user_id).await;
                let _ = response.send(result);
            }
            TransactionServiceRequest::UpdateStatus {
                id,
                status,
                response,
            } => {
                let result = self.update_status(&id, status).await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct TransactionService;

impl TransactionService {
    pub fn new() -> Self {
        TransactionService {}
    }
}

#[async_trait]
impl Service<TransactionServiceRequest, TransactionRequestHandler> for TransactionService {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transactions::Operator;
    use crate::models::users::{AccountType, KycStatus};

    fn handler() -> (
        tempfile::TempDir,
        TransactionRequestHandler,
        mpsc::Receiver<NotifierRequest>,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let db = sled::open(dir.path()).unwrap();
        let (notifier_tx, notifier_rx) = mpsc::channel(8);
        let handler = TransactionRequestHandler::new(&db, notifier_tx).unwrap();
        (dir, handler, notifier_rx)
    }

    fn user() -> User {
        User {
            id: "U1".to_string(),
            mobile: "01700000000".to_string(),
            email: String::new(),
            name: None,
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

    fn add_money() -> NewAddMoney {
        NewAddMoney {
            method: "Bkash".to_string(),
            amount: 500.0,
            sender_mobile: "01700000000".to_string(),
            payment_ref: "ABC123".to_string(),
        }
    }

    #[tokio::test]
    async fn add_money_writes_one_pending_record_and_one_alert() {
        let (_dir, handler, mut notifier_rx) = handler();

        let tx = handler
            .submit_add_money(Some(user()), add_money())
            .await
            .unwrap();
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.kind, TransactionKind::AddMoney);

        let stored = handler.list_all().await.unwrap();
        assert_eq!(stored.len(), 1);

        let NotifierRequest::AdminAlert { text } = notifier_rx.recv().await.unwrap();
        assert!(text.contains("500"));
        assert!(text.contains("ABC123"));
        assert!(notifier_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn service_order_records_operator_and_amount() {
        let (_dir, handler, mut notifier_rx) = handler();

        let tx = handler
            .submit_service_order(
                Some(user()),
                NewServiceOrder {
                    kind: TransactionKind::Recharge,
                    operator: Operator::Gp,
                    target_number: "01800000000".to_string(),
                    amount: 199.0,
                    description: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(tx.operator, Some(Operator::Gp));
        assert_eq!(tx.amount, 199.0);
        assert_eq!(tx.status, TransactionStatus::Pending);

        let NotifierRequest::AdminAlert { text } = notifier_rx.recv().await.unwrap();
        assert!(text.contains("GP"));
        assert!(text.contains("199"));
    }

    #[tokio::test]
    async fn guest_submission_is_tagged_not_rejected() {
        let (_dir, handler, _rx) = handler();

        let tx = handler.submit_add_money(None, add_money()).await.unwrap();
        assert_eq!(tx.user_id, GUEST_USER_ID);
        assert_eq!(tx.user_mobile, "N/A");
    }

    #[tokio::test]
    async fn validation_failures_leave_no_record_and_no_alert() {
        let (_dir, handler, mut notifier_rx) = handler();

        let mut bad_amount = add_money();
        bad_amount.amount = 0.0;
        assert!(matches!(
            handler.submit_add_money(Some(user()), bad_amount).await,
            Err(ServiceError::Validation(_))
        ));

        let mut missing_ref = add_money();
        missing_ref.payment_ref = "  ".to_string();
        assert!(matches!(
            handler.submit_add_money(Some(user()), missing_ref).await,
            Err(ServiceError::Validation(_))
        ));

        assert!(handler.list_all().await.unwrap().is_empty());
        assert!(notifier_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn admin_resolution_cannot_reopen_terminal_status() {
        let (_dir, handler, _rx) = handler();
        let tx = handler
            .submit_add_money(Some(user()), add_money())
            .await
            .unwrap();

        handler
            .update_status(&tx.id, TransactionStatus::Success)
            .await
            .unwrap();
        assert!(matches!(
            handler.update_status(&tx.id, TransactionStatus::Pending).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            handler.update_status("missing", TransactionStatus::Failed).await,
            Err(ServiceError::NotFound)
        ));
    }
}
