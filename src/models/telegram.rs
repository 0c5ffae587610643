use serde::{Deserialize, Serialize};

/// Identity object provided by the embedding host shell (Telegram mini-app
/// context). Absent when the app runs outside a recognized host.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TelegramIdentity {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl TelegramIdentity {
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self
                .username
                .clone()
                .unwrap_or_else(|| self.id.to_string()),
        }
    }
}
