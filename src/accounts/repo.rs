use async_trait::async_trait;
use sqlx::PgPool;

use crate::accounts::dto::AccountPayload;
use crate::accounts::repo_types::Account;
use crate::error::{AccountError, Result};

/// Single point of access to persisted accounts.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Persists a new account; a missing `date_joined` becomes today.
    async fn create(&self, payload: AccountPayload) -> Result<Account>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Account>>;
    /// All accounts in insertion order.
    async fn list_all(&self) -> Result<Vec<Account>>;
    /// Replaces every field of an existing account, `date_joined` included;
    /// `NotFound` otherwise.
    async fn update(&self, id: i64, payload: AccountPayload) -> Result<Account>;
    /// Removes the account if present. Deleting an absent id is not an error.
    async fn delete(&self, id: i64) -> Result<()>;
}

#[derive(Clone)]
pub struct PgAccountRepository {
    db: PgPool,
}

impl PgAccountRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn create(&self, payload: AccountPayload) -> Result<Account> {
        let date_joined = payload.joined_on();
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (name, email, address, phone_number, date_joined)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, address, phone_number, date_joined
            "#,
        )
        .bind(payload.name)
        .bind(payload.email)
        .bind(payload.address)
        .bind(payload.phone_number)
        .bind(date_joined)
        .fetch_one(&self.db)
        .await?;
        Ok(account)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, email, address, phone_number, date_joined
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(account)
    }

    async fn list_all(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, email, address, phone_number, date_joined
            FROM accounts
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn update(&self, id: i64, payload: AccountPayload) -> Result<Account> {
        let date_joined = payload.joined_on();
        sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts
            SET name = $2, email = $3, address = $4, phone_number = $5, date_joined = $6
            WHERE id = $1
            RETURNING id, name, email, address, phone_number, date_joined
            "#,
        )
        .bind(id)
        .bind(payload.name)
        .bind(payload.email)
        .bind(payload.address)
        .bind(payload.phone_number)
        .bind(date_joined)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AccountError::NotFound(id.to_string()))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
pub use memory::InMemoryAccountRepository;

#[cfg(test)]
mod memory {
    use std::collections::BTreeMap;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::AccountRepository;
    use crate::accounts::dto::AccountPayload;
    use crate::accounts::repo_types::Account;
    use crate::error::{AccountError, Result};

    #[derive(Default)]
    struct Table {
        last_id: i64,
        rows: BTreeMap<i64, Account>,
    }

    /// Stand-in for the accounts table. Ids come from a counter that only
    /// grows, so a deleted id is never handed out again.
    #[derive(Default)]
    pub struct InMemoryAccountRepository {
        table: Mutex<Table>,
    }

    #[async_trait]
    impl AccountRepository for InMemoryAccountRepository {
        async fn create(&self, payload: AccountPayload) -> Result<Account> {
            let mut table = self.table.lock().await;
            table.last_id += 1;
            let account = Account {
                id: table.last_id,
                date_joined: payload.joined_on(),
                name: payload.name,
                email: payload.email,
                address: payload.address,
                phone_number: payload.phone_number,
            };
            table.rows.insert(account.id, account.clone());
            Ok(account)
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<Account>> {
            Ok(self.table.lock().await.rows.get(&id).cloned())
        }

        async fn list_all(&self) -> Result<Vec<Account>> {
            Ok(self.table.lock().await.rows.values().cloned().collect())
        }

        async fn update(&self, id: i64, payload: AccountPayload) -> Result<Account> {
            let mut table = self.table.lock().await;
            let row = table
                .rows
                .get_mut(&id)
                .ok_or_else(|| AccountError::NotFound(id.to_string()))?;
            row.date_joined = payload.joined_on();
            row.name = payload.name;
            row.email = payload.email;
            row.address = payload.address;
            row.phone_number = payload.phone_number;
            Ok(row.clone())
        }

        async fn delete(&self, id: i64) -> Result<()> {
            self.table.lock().await.rows.remove(&id);
            Ok(())
        }
    }
}
