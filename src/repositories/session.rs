use sled::Db;

use crate::models::users::User;

const SESSION_TREE: &str = "session";
const USER_KEY: &str = "user";
const ADMIN_KEY: &str = "is_admin";

/// Persisted session state: the serialized current user under one key and the
/// admin-authenticated flag under another.
#[derive(Clone)]
pub struct SessionRepository {
    tree: sled::Tree,
}

impl SessionRepository {
    pub fn new(db: &Db) -> Result<Self, anyhow::Error> {
        let tree = db.open_tree(SESSION_TREE)?;
        Ok(SessionRepository { tree })
    }

    pub fn load_user(&self) -> Result<Option<User>, anyhow::Error> {
        match self.tree.get(USER_KEY)? {
            Some(ivec) => Ok(Some(serde_json::from_slice(&ivec)?)),
            None => Ok(None),
        }
    }

    pub fn save_user(&self, user: Option<&User>) -> Result<(), anyhow::Error> {
        match user {
            Some(user) => {
                let encoded = serde_json::to_vec(user)?;
                self.tree.insert(USER_KEY, encoded)?;
            }
            None => {
                self.tree.remove(USER_KEY)?;
            }
        }
        Ok(())
    }

    pub fn load_admin(&self) -> Result<bool, anyhow::Error> {
        Ok(self
            .tree
            .get(ADMIN_KEY)?
            .map(|ivec| ivec.as_ref() == b"true")
            .unwrap_or(false))
    }

    pub fn save_admin(&self, is_admin: bool) -> Result<(), anyhow::Error> {
        let value = if is_admin { "true" } else { "false" };
        self.tree.insert(ADMIN_KEY, value)?;
        Ok(())
    }
}
