use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Singleton application configuration, overwritten whole on every admin save.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AppSettings {
    pub latest_version: String,
    pub current_version: String,
    pub update_url: String,
    pub maintenance_mode: bool,
    pub notice: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            latest_version: "1.0.0".to_string(),
            current_version: "1.0.0".to_string(),
            update_url: String::new(),
            maintenance_mode: false,
            notice: String::new(),
        }
    }
}

/// Singleton map of payment method name to the destination account the user is
/// told to send funds to. Edited by the admin, read by the add-money flow.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct PaymentNumbers {
    pub numbers: BTreeMap<String, String>,
}
