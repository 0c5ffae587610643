use sled::Db;

use crate::models::app_settings::{AppSettings, PaymentNumbers};

const SETTINGS_TREE: &str = "settings";
const APP_SETTINGS_KEY: &str = "app_settings";
const PAYMENT_NUMBERS_KEY: &str = "payment_numbers";

/// The `settings` collection: two singleton documents under fixed keys, read
/// whole and overwritten whole. Missing documents yield defaults.
#[derive(Clone)]
pub struct SettingsRepository {
    tree: sled::Tree,
}

impl SettingsRepository {
    pub fn new(db: &Db) -> Result<Self, anyhow::Error> {
        let tree = db.open_tree(SETTINGS_TREE)?;
        Ok(SettingsRepository { tree })
    }

    pub fn get_app_settings(&self) -> Result<AppSettings, anyhow::Error> {
        match self.tree.get(APP_SETTINGS_KEY)? {
            Some(ivec) => Ok(serde_json::from_slice(&ivec)?),
            None => Ok(AppSettings::default()),
        }
    }

    pub fn save_app_settings(&self, settings: &AppSettings) -> Result<(), anyhow::Error> {
        let encoded = serde_json::to_vec(settings)?;
        self.tree.insert(APP_SETTINGS_KEY, encoded)?;
        Ok(())
    }

    pub fn get_payment_numbers(&self) -> Result<PaymentNumbers, anyhow::Error> {
        match self.tree.get(PAYMENT_NUMBERS_KEY)? {
            Some(ivec) => Ok(serde_json::from_slice(&ivec)?),
            None => Ok(PaymentNumbers::default()),
        }
    }

    pub fn save_payment_numbers(&self, numbers: &PaymentNumbers) -> Result<(), anyhow::Error> {
        let encoded = serde_json::to_vec(numbers)?;
        self.tree.insert(PAYMENT_NUMBERS_KEY, encoded)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_before_first_save_last_write_after() {
        let dir = tempfile::tempdir().unwrap();
        let db = sled::open(dir.path()).unwrap();
        let repo = SettingsRepository::new(&db).unwrap();

        assert_eq!(repo.get_app_settings().unwrap(), AppSettings::default());

        let mut settings = AppSettings::default();
        settings.notice = "Recharge offers today!".to_string();
        repo.save_app_settings(&settings).unwrap();

        settings.maintenance_mode = true;
        repo.save_app_settings(&settings).unwrap();

        let loaded = repo.get_app_settings().unwrap();
        assert!(loaded.maintenance_mode);
        assert_eq!(loaded.notice, "Recharge offers today!");
    }

    #[test]
    fn payment_numbers_singleton_overwrites_whole() {
        let dir = tempfile::tempdir().unwrap();
        let db = sled::open(dir.path()).unwrap();
        let repo = SettingsRepository::new(&db).unwrap();

        assert!(repo.get_payment_numbers().unwrap().numbers.is_empty());

        let mut numbers = PaymentNumbers::default();
        numbers
            .numbers
            .insert("Bkash".to_string(), "01711111111".to_string());
        numbers
            .numbers
            .insert("Nagad".to_string(), "01822222222".to_string());
        repo.save_payment_numbers(&numbers).unwrap();

        let mut replacement = PaymentNumbers::default();
        replacement
            .numbers
            .insert("Bkash".to_string(), "01733333333".to_string());
        repo.save_payment_numbers(&replacement).unwrap();

        let loaded = repo.get_payment_numbers().unwrap();
        assert_eq!(loaded.numbers.len(), 1);
        assert_eq!(loaded.numbers["Bkash"], "01733333333");
    }
}
