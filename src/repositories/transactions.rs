use anyhow::bail;
use sled::Db;

use crate::models::transactions::{Transaction, TransactionStatus};

const TRANSACTIONS_TREE: &str = "transactions";

/// The `transactions` collection, keyed by transaction id. Listing reads the
/// whole tree and sorts in code, most recent first.
#[derive(Clone)]
pub struct TransactionRepository {
    tree: sled::Tree,
}

impl TransactionRepository {
    pub fn new(db: &Db) -> Result<Self, anyhow::Error> {
        let tree = db.open_tree(TRANSACTIONS_TREE)?;
        Ok(TransactionRepository { tree })
    }

    pub fn insert_transaction(&self, transaction: &Transaction) -> Result<(), anyhow::Error> {
        let encoded = serde_json::to_vec(transaction)?;
        self.tree.insert(transaction.id.as_bytes(), encoded)?;
        Ok(())
    }

    pub fn get_transaction(&self, id: &str) -> Result<Option<Transaction>, anyhow::Error> {
        match self.tree.get(id.as_bytes())? {
            Some(ivec) => Ok(Some(serde_json::from_slice(&ivec)?)),
            None => Ok(None),
        }
    }

    pub fn list_transactions(&self) -> Result<Vec<Transaction>, anyhow::Error> {
        let mut transactions = Vec::new();
        for kv in self.tree.iter() {
            let (_, ivec) = kv?;
            transactions.push(serde_json::from_slice::<Transaction>(&ivec)?);
        }
        transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(transactions)
    }

    pub fn list_transactions_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Transaction>, anyhow::Error> {
        let mut transactions = self.list_transactions()?;
        transactions.retain(|tx| tx.user_id == user_id);
        Ok(transactions)
    }

    /// A transaction that reached Success or Failed stays there; only a
    /// pending record can move.
    pub fn update_transaction_status(
        &self,
        id: &str,
        status: TransactionStatus,
    ) -> Result<Transaction, anyhow::Error> {
        let mut transaction = match self.get_transaction(id)? {
            Some(tx) => tx,
            None => bail!("transaction not found: {}", id),
        };

        if transaction.status.is_terminal() && transaction.status != status {
            bail!(
                "transaction {} already resolved as {:?}",
                id,
                transaction.status
            );
        }

        transaction.status = status;
        let encoded = serde_json::to_vec(&transaction)?;
        self.tree.insert(transaction.id.as_bytes(), encoded)?;
        Ok(transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transactions::{TransactionKind, GUEST_USER_ID};

    fn open_repo() -> (tempfile::TempDir, TransactionRepository) {
        let dir = tempfile::tempdir().unwrap();
        let db = sled::open(dir.path()).unwrap();
        let repo = TransactionRepository::new(&db).unwrap();
        (dir, repo)
    }

    fn pending_tx(id: &str, user_id: &str) -> Transaction {
        Transaction {
            id: id.to_string(),
            user_id: user_id.to_string(),
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
    fn pending_can_move_to_success() {
        let (_dir, repo) = open_repo();
        repo.insert_transaction(&pending_tx("T1", "U1")).unwrap();

        let resolved = repo
            .update_transaction_status("T1", TransactionStatus::Success)
            .unwrap();
        assert_eq!(resolved.status, TransactionStatus::Success);
    }

    #[test]
    fn terminal_status_is_never_reopened() {
        let (_dir, repo) = open_repo();
        repo.insert_transaction(&pending_tx("T1", "U1")).unwrap();
        repo.update_transaction_status("T1", TransactionStatus::Failed)
            .unwrap();

        assert!(repo
            .update_transaction_status("T1", TransactionStatus::Pending)
            .is_err());
        assert!(repo
            .update_transaction_status("T1", TransactionStatus::Success)
            .is_err());

        let stored = repo.get_transaction("T1").unwrap().unwrap();
        assert_eq!(stored.status, TransactionStatus::Failed);
    }

    #[test]
    fn listing_is_most_recent_first_and_filters_by_user() {
        let (_dir, repo) = open_repo();
        let mut older = pending_tx("T1", "U1");
        older.created_at = chrono::Utc::now() - chrono::Duration::hours(1);
        repo.insert_transaction(&older).unwrap();
        repo.insert_transaction(&pending_tx("T2", "U2")).unwrap();
        repo.insert_transaction(&pending_tx("T3", GUEST_USER_ID))
            .unwrap();

        let all = repo.list_transactions().unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[0].created_at >= all[1].created_at);

        let mine = repo.list_transactions_for_user("U1").unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, "T1");
    }

    #[test]
    fn orphaned_transactions_survive_user_deletion() {
        // Deleting a user happens in a different collection; nothing here
        // cascades. The record keeps pointing at the removed id.
        let (_dir, repo) = open_repo();
        repo.insert_transaction(&pending_tx("T1", "U-GONE")).unwrap();

        let remaining = repo.list_transactions_for_user("U-GONE").unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].user_id, "U-GONE");
    }
}
