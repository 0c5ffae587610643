use async_trait::async_trait;
use serde_json::json;

use super::{RequestHandler, Service};
use crate::models::transactions::Transaction;
use crate::models::users::User;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Requests on this queue carry no response channel on purpose: once a caller
/// has handed a message over, delivery is not its problem. A failed or skipped
/// send can never reach back into the write path that triggered it.
pub enum NotifierRequest {
    AdminAlert { text: String },
}

#[derive(Clone)]
pub struct TelegramNotifier {
    bot_token: Option<String>,
    chat_id: Option<String>,
    client: reqwest::Client,
    api_base: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: Option<String>, chat_id: Option<String>) -> Self {
        TelegramNotifier {
            bot_token,
            chat_id,
            client: reqwest::Client::new(),
            api_base: TELEGRAM_API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.to_string();
        self
    }

    async fn send_admin_notification(&self, text: &str) {
        let (bot_token, chat_id) = match (&self.bot_token, &self.chat_id) {
            (Some(token), Some(chat)) => (token, chat),
            _ => {
                log::warn!("Telegram notification skipped: bot token or chat id missing.");
                return;
            }
        };

        let url = format!("{}/bot{}/sendMessage", self.api_base, bot_token);
        let payload = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true
        });

        match self.client.post(&url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                log::error!("Telegram API error: {} {}", status, body);
            }
            Err(e) => {
                log::error!("Notification failed: {}", e);
            }
        }
    }
}

#[async_trait]
impl RequestHandler<NotifierRequest> for TelegramNotifier {
    async fn handle_request(&self, request: NotifierRequest) {
        match request {
            NotifierRequest::AdminAlert { text } => {
                self.send_admin_notification(&text).await;
            }
        }
    }
}

pub struct NotifierService;

impl NotifierService {
    pub fn new() -> Self {
        NotifierService {}
    }
}

#[async_trait]
impl Service<NotifierRequest, TelegramNotifier> for NotifierService {}

pub fn format_registration_msg(user: &User) -> String {
    format!(
        "<b>\u{1F195} New user registration!</b>\n\
         <b>Name:</b> {}\n\
         <b>Mobile:</b> <code>{}</code>\n\
         <b>Email:</b> {}\n\
         <b>Type:</b> {:?}\n\
         <b>Refer code:</b> {}\n\
         <b>Id:</b> <code>{}</code>\n\
         <i>#Registration #NewUser</i>",
        user.name.as_deref().unwrap_or("N/A"),
        user.mobile,
        if user.email.is_empty() { "N/A" } else { &user.email },
        user.account_type,
        user.refer_code.as_deref().unwrap_or("None"),
        user.id,
    )
}

pub fn format_add_money_msg(tx: &Transaction) -> String {
    format!(
        "<b>\u{1F4B0} Balance add request!</b>\n\
         <b>Amount:</b> \u{09F3}{}\n\
         <b>Method:</b> {}\n\
         <b>User:</b> <code>{}</code>\n\
         <b>Sender number:</b> <code>{}</code>\n\
         <b>TrxID:</b> <code>{}</code>\n\
         <b>Status:</b> Pending\n\
         <i>Verify from the admin panel.</i>",
        tx.amount,
        tx.method.as_deref().unwrap_or("N/A"),
        tx.user_mobile,
        tx.sender_mobile.as_deref().unwrap_or("N/A"),
        tx.payment_ref.as_deref().unwrap_or("N/A"),
    )
}

pub fn format_order_msg(tx: &Transaction) -> String {
    let operator = tx
        .operator
        .map(|op| op.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    format!(
        "<b>\u{1F4E6} New order request!</b>\n\
         <b>Category:</b> {}\n\
         <b>Operator:</b> <b>{}</b>\n\
         <b>Target number:</b> <code>{}</code>\n\
         <b>Amount:</b> \u{09F3}{}\n\
         <b>Ordered by:</b> <code>{}</code>\n\
         <b>Status:</b> Pending\n\
         <i>#NewOrder #OrderPending #{}</i>",
        tx.kind,
        operator,
        tx.target_number.as_deref().unwrap_or("N/A"),
        tx.amount,
        tx.user_mobile,
        operator,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transactions::{
        Operator, TransactionKind, TransactionStatus, GUEST_USER_ID,
    };

    fn add_money_tx() -> Transaction {
        Transaction {
            id: "T1".to_string(),
            user_id: GUEST_USER_ID.to_string(),
            user_mobile: "01700000000".to_string(),
            kind: TransactionKind::AddMoney,
            operator: None,
            method: Some("Bkash".to_string()),
            sender_mobile: Some("01700000000".to_string()),
            payment_ref: Some("ABC123".to_string()),
            target_number: None,
            amount: 500.0,
            status: TransactionStatus::Pending,
            created_at: chrono::Utc::now(),
            description: None,
        }
    }

    #[test]
    fn add_money_alert_names_amount_and_reference() {
        let text = format_add_money_msg(&add_money_tx());
        assert!(text.contains("500"));
        assert!(text.contains("ABC123"));
        assert!(text.contains("Bkash"));
        assert!(text.contains("Pending"));
    }

    #[test]
    fn order_alert_names_operator_target_and_amount() {
        let mut tx = add_money_tx();
        tx.kind = TransactionKind::Recharge;
        tx.operator = Some(Operator::Gp);
        tx.target_number = Some("01800000000".to_string());
        tx.amount = 199.0;

        let text = format_order_msg(&tx);
        assert!(text.contains("GP"));
        assert!(text.contains("01800000000"));
        assert!(text.contains("199"));
    }

    #[tokio::test]
    async fn missing_credentials_short_circuit_without_network() {
        // Point at an unroutable base so an accidental request would error
        // loudly rather than hang.
        let notifier = TelegramNotifier::new(None, None).with_api_base("http://127.0.0.1:9");
        notifier
            .handle_request(NotifierRequest::AdminAlert {
                text: "hello".to_string(),
            })
            .await;
    }
}
