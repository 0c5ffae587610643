use anyhow::bail;
use sled::Db;

use crate::models::users::User;

const USERS_TREE: &str = "users";

/// The `users` collection. Documents are JSON, keyed by mobile number, so one
/// mobile maps to at most one account. Reads that are not key lookups scan the
/// whole tree and filter in code.
#[derive(Clone)]
pub struct UserRepository {
    tree: sled::Tree,
}

impl UserRepository {
    pub fn new(db: &Db) -> Result<Self, anyhow::Error> {
        let tree = db.open_tree(USERS_TREE)?;
        Ok(UserRepository { tree })
    }

    pub fn insert_user(&self, user: &User) -> Result<(), anyhow::Error> {
        if self.tree.contains_key(user.mobile.as_bytes())? {
            bail!("user already exists: {}", user.mobile);
        }
        self.put_user(user)
    }

    /// Whole-document overwrite. Concurrent writers race under last-write-wins;
    /// that is the documented policy, not an oversight.
    pub fn put_user(&self, user: &User) -> Result<(), anyhow::Error> {
        let encoded = serde_json::to_vec(user)?;
        self.tree.insert(user.mobile.as_bytes(), encoded)?;
        Ok(())
    }

    pub fn get_user_by_mobile(&self, mobile: &str) -> Result<Option<User>, anyhow::Error> {
        match self.tree.get(mobile.as_bytes())? {
            Some(ivec) => Ok(Some(serde_json::from_slice(&ivec)?)),
            None => Ok(None),
        }
    }

    pub fn find_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>, anyhow::Error> {
        for kv in self.tree.iter() {
            let (_, ivec) = kv?;
            let user: User = serde_json::from_slice(&ivec)?;
            if user.telegram_id == Some(telegram_id) {
                return Ok(Some(user));
            }
        }
        Ok(None)
    }

    pub fn list_users(&self) -> Result<Vec<User>, anyhow::Error> {
        let mut users = Vec::new();
        for kv in self.tree.iter() {
            let (_, ivec) = kv?;
            users.push(serde_json::from_slice(&ivec)?);
        }
        Ok(users)
    }

    /// Absolute overwrite of the balance, not a delta.
    pub fn set_balance(&self, mobile: &str, amount: f64) -> Result<User, anyhow::Error> {
        let mut user = match self.get_user_by_mobile(mobile)? {
            Some(user) => user,
            None => bail!("user not found: {}", mobile),
        };
        user.balance = amount;
        self.put_user(&user)?;
        Ok(user)
    }

    pub fn set_blocked(&self, mobile: &str, blocked: bool) -> Result<User, anyhow::Error> {
        let mut user = match self.get_user_by_mobile(mobile)? {
            Some(user) => user,
            None => bail!("user not found: {}", mobile),
        };
        user.is_blocked = blocked;
        self.put_user(&user)?;
        Ok(user)
    }

    pub fn set_pin(&self, mobile: &str, pin: &str) -> Result<User, anyhow::Error> {
        let mut user = match self.get_user_by_mobile(mobile)? {
            Some(user) => user,
            None => bail!("user not found: {}", mobile),
        };
        user.pin = pin.to_string();
        self.put_user(&user)?;
        Ok(user)
    }

    /// Permanent removal. Transactions referencing the user are left in place.
    pub fn delete_user(&self, mobile: &str) -> Result<(), anyhow::Error> {
        if self.tree.remove(mobile.as_bytes())?.is_none() {
            bail!("user not found: {}", mobile);
        }
        Ok(())
    }
}
