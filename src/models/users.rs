use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum AccountType {
    #[default]
    Normal,
    Agent,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum KycStatus {
    #[default]
    None,
    Pending,
    Verified,
}

/// One document in the `users` collection, keyed by mobile number.
/// The pin is stored in plain text.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct User {
    pub id: String,
    pub mobile: String,
    pub email: String,
    pub name: Option<String>,
    pub pin: String,
    pub balance: f64,
    pub account_type: AccountType,
    pub refer_code: Option<String>,
    pub device_id: String,
    pub is_blocked: bool,
    pub kyc_status: KycStatus,
    pub telegram_id: Option<i64>,
}

/// Profile fields collected on the first registration step. The pin is chosen
/// on the verification step, not here.
#[derive(Clone, Debug, Deserialize)]
pub struct NewUserProfile {
    pub mobile: String,
    pub email: String,
    pub name: Option<String>,
    pub refer_code: Option<String>,
    #[serde(default)]
    pub account_type: AccountType,
}
