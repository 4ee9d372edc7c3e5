use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sea_orm::{
    ConnectionTrait, DatabaseConnection, QueryFilter, QueryOrder, prelude::*, sea_query::Expr,
};

use crate::{EngineError, ResultEngine, ledger, ledger::Ledger};

mod expenses;
mod groups;
mod settlements;
mod sheet;

pub use expenses::ExpenseUpdate;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// The expense-splitting engine.
///
/// All state lives in the database; the engine itself only carries the
/// connection and a per-group lock table. Every mutation of a group's ledger
/// runs with that group's lock held for the whole read-modify-write, inside
/// one DB transaction, so concurrent mutations of the same group serialize
/// while different groups proceed independently. Reads never take the lock.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    group_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub(crate) fn database(&self) -> &DatabaseConnection {
        &self.database
    }

    /// Lock guarding mutations of one group's ledger.
    pub(crate) fn group_lock(&self, group_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = match self.group_locks.lock() {
            Ok(locks) => locks,
            // A poisoned map only means another thread panicked while
            // inserting; the map itself is still usable.
            Err(poisoned) => poisoned.into_inner(),
        };
        locks
            .entry(group_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    pub(crate) fn drop_group_lock(&self, group_id: &str) {
        let mut locks = match self.group_locks.lock() {
            Ok(locks) => locks,
            Err(poisoned) => poisoned.into_inner(),
        };
        locks.remove(group_id);
    }

    /// Fetch a group row or fail with `GroupNotFound`.
    pub(crate) async fn require_group<C: ConnectionTrait>(
        &self,
        db: &C,
        group_id: &str,
    ) -> ResultEngine<crate::groups::Model> {
        crate::groups::Entity::find_by_id(group_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::GroupNotFound(group_id.to_string()))
    }

    /// Authorization guard: the acting user must hold a balance entry in the
    /// group.
    pub(crate) async fn require_member<C: ConnectionTrait>(
        &self,
        db: &C,
        group_id: &str,
        user_id: &str,
    ) -> ResultEngine<()> {
        let found = ledger::Entity::find()
            .filter(ledger::Column::GroupId.eq(group_id))
            .filter(ledger::Column::MemberId.eq(user_id))
            .one(db)
            .await?;
        if found.is_none() {
            return Err(EngineError::Forbidden(format!(
                "{user_id} is not a member of this group"
            )));
        }
        Ok(())
    }

    /// Load a group's ledger in stable entry order (row insertion order).
    pub(crate) async fn load_ledger<C: ConnectionTrait>(
        &self,
        db: &C,
        group_id: &str,
    ) -> ResultEngine<Ledger> {
        let models = ledger::Entity::find()
            .filter(ledger::Column::GroupId.eq(group_id))
            .order_by_asc(ledger::Column::Id)
            .all(db)
            .await?;
        let entries = models.into_iter().map(Into::into).collect();
        Ok(Ledger::from_entries(group_id.to_string(), entries))
    }

    /// Write back the balances of the members named in `touched`.
    pub(crate) async fn persist_balances<'a, C, I>(
        &self,
        db: &C,
        ledger: &Ledger,
        touched: I,
    ) -> ResultEngine<()>
    where
        C: ConnectionTrait,
        I: IntoIterator<Item = &'a String>,
    {
        for member_id in touched {
            let amount = ledger.balance_of(member_id).ok_or_else(|| {
                EngineError::MemberNotInGroup(member_id.clone())
            })?;
            ledger::Entity::update_many()
                .col_expr(ledger::Column::AmountMinor, Expr::value(amount.cents()))
                .filter(ledger::Column::GroupId.eq(ledger.group_id.as_str()))
                .filter(ledger::Column::MemberId.eq(member_id.as_str()))
                .exec(db)
                .await?;
        }
        Ok(())
    }
}

pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidAmount(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> Engine {
        Engine {
            database: self.database,
            group_locks: Mutex::new(HashMap::new()),
        }
    }
}
