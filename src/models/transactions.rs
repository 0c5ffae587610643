use serde::{Deserialize, Serialize};

/// Marker written into `user_id` when a request is submitted without a session.
pub const GUEST_USER_ID: &str = "guest";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum Operator {
    #[serde(rename = "GP")]
    Gp,
    Robi,
    Airtel,
    Banglalink,
    Teletalk,
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operator::Gp => "GP",
            Operator::Robi => "Robi",
            Operator::Airtel => "Airtel",
            Operator::Banglalink => "Banglalink",
            Operator::Teletalk => "Teletalk",
        };
        write!(f, "{}", name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum TransactionKind {
    Recharge,
    Internet,
    Minute,
    Offer,
    #[serde(rename = "Add Money")]
    AddMoney,
    #[serde(rename = "Bank Withdraw")]
    BankWithdraw,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TransactionKind::Recharge => "Recharge",
            TransactionKind::Internet => "Internet",
            TransactionKind::Minute => "Minute",
            TransactionKind::Offer => "Offer",
            TransactionKind::AddMoney => "Add Money",
            TransactionKind::BankWithdraw => "Bank Withdraw",
        };
        write!(f, "{}", name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Success | TransactionStatus::Failed)
    }
}

/// One monetary request. Created in `Pending`; resolved out-of-band by an
/// operator. A terminal status is never reopened.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub user_mobile: String,
    pub kind: TransactionKind,
    pub operator: Option<Operator>,
    pub method: Option<String>,
    pub sender_mobile: Option<String>,
    pub payment_ref: Option<String>,
    pub target_number: Option<String>,
    pub amount: f64,
    pub status: TransactionStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewAddMoney {
    pub method: String,
    pub amount: f64,
    pub sender_mobile: String,
    pub payment_ref: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewServiceOrder {
    pub kind: TransactionKind,
    pub operator: Operator,
    pub target_number: String,
    pub amount: f64,
    pub description: Option<String>,
}
