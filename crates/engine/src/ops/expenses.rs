//! Expense ops: each one is a single locked read-modify-write over the
//! group's ledger.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, MoneyCents, ResultEngine,
    expenses::{self, Expense},
    groups,
    split::{clear_deltas, merge_deltas, split_deltas},
};

use super::{Engine, normalize_optional_text, normalize_required_name, with_tx};

/// Fields of an expense that can change on edit. `None` keeps the stored
/// value.
#[derive(Clone, Debug, Default)]
pub struct ExpenseUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub amount: Option<MoneyCents>,
    pub category: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub paid_by: Option<String>,
    pub members: Option<Vec<String>>,
}

impl Engine {
    /// Records an expense and applies its split to the group ledger.
    #[allow(clippy::too_many_arguments)]
    pub async fn add_expense(
        &self,
        group_id: &str,
        name: &str,
        description: Option<&str>,
        amount: MoneyCents,
        category: Option<&str>,
        date: DateTime<Utc>,
        user_id: &str,
        paid_by: &str,
        members: &[String],
    ) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "expense")?;
        let lock = self.group_lock(group_id);
        let _guard = lock.lock().await;

        with_tx!(self, |db_tx| {
            async {
                let group_model = self.require_group(&db_tx, group_id).await?;
                self.require_member(&db_tx, group_id, user_id).await?;

                let deltas = split_deltas(amount, paid_by, members)?;
                let mut ledger = self.load_ledger(&db_tx, group_id).await?;
                ledger.apply(&deltas)?;
                self.persist_balances(&db_tx, &ledger, deltas.keys()).await?;

                let currency = crate::Currency::try_from(group_model.currency.as_str())
                    .unwrap_or_default();
                let expense = Expense::new(
                    group_id.to_string(),
                    name.clone(),
                    normalize_optional_text(description),
                    amount,
                    currency,
                    normalize_optional_text(category),
                    date,
                    user_id.to_string(),
                    paid_by.to_string(),
                    members.to_vec(),
                )?;
                expenses::ActiveModel::try_from(&expense)?
                    .insert(&db_tx)
                    .await?;

                let total = groups::ActiveModel {
                    id: ActiveValue::Set(group_id.to_string()),
                    total_expenditure_minor: ActiveValue::Set(
                        group_model.total_expenditure_minor + amount.cents(),
                    ),
                    ..Default::default()
                };
                total.update(&db_tx).await?;

                Ok(expense.id)
            }
            .await
        })
    }

    /// Edits an expense.
    ///
    /// The reversal of the old split and the application of the new one are
    /// merged into one delta map and applied in a single ledger mutation, so
    /// no intermediate state where only the old split has been cleared can
    /// ever be observed or persisted.
    pub async fn update_expense(
        &self,
        group_id: &str,
        expense_id: Uuid,
        user_id: &str,
        update: ExpenseUpdate,
    ) -> ResultEngine<()> {
        let lock = self.group_lock(group_id);
        let _guard = lock.lock().await;

        with_tx!(self, |db_tx| {
            async {
                let group_model = self.require_group(&db_tx, group_id).await?;
                self.require_member(&db_tx, group_id, user_id).await?;

                let old = self.require_expense(&db_tx, group_id, expense_id).await?;

                let new_amount = update.amount.unwrap_or(old.amount);
                let new_paid_by = update.paid_by.clone().unwrap_or_else(|| old.paid_by.clone());
                let new_members = update.members.clone().unwrap_or_else(|| old.members.clone());

                // Reversal uses the *original* amount/payer/members, so the
                // rounded share applied back then is exactly undone.
                let deltas = merge_deltas(
                    clear_deltas(old.amount, &old.paid_by, &old.members)?,
                    split_deltas(new_amount, &new_paid_by, &new_members)?,
                );
                let mut ledger = self.load_ledger(&db_tx, group_id).await?;
                ledger.apply(&deltas)?;
                self.persist_balances(&db_tx, &ledger, deltas.keys()).await?;

                let per_member = crate::money::share(new_amount, new_members.len())?;
                let new = Expense {
                    name: match update.name.as_deref() {
                        Some(name) => normalize_required_name(name, "expense")?,
                        None => old.name.clone(),
                    },
                    description: update
                        .description
                        .as_deref()
                        .map_or_else(|| old.description.clone(), |d| {
                            normalize_optional_text(Some(d))
                        }),
                    amount: new_amount,
                    category: update
                        .category
                        .as_deref()
                        .map_or_else(|| old.category.clone(), |c| normalize_optional_text(Some(c))),
                    date: update.date.unwrap_or(old.date),
                    paid_by: new_paid_by,
                    members: new_members.clone(),
                    per_member,
                    ..old.clone()
                };
                let mut active = expenses::ActiveModel::try_from(&new)?;
                active.id = ActiveValue::Unchanged(old.id.to_string());
                active.update(&db_tx).await?;

                let total = groups::ActiveModel {
                    id: ActiveValue::Set(group_id.to_string()),
                    total_expenditure_minor: ActiveValue::Set(
                        group_model.total_expenditure_minor - old.amount.cents()
                            + new_amount.cents(),
                    ),
                    ..Default::default()
                };
                total.update(&db_tx).await?;

                Ok(())
            }
            .await
        })
    }

    /// Deletes an expense, reversing its split on the ledger.
    pub async fn delete_expense(
        &self,
        group_id: &str,
        expense_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<()> {
        let lock = self.group_lock(group_id);
        let _guard = lock.lock().await;

        with_tx!(self, |db_tx| {
            async {
                let group_model = self.require_group(&db_tx, group_id).await?;
                self.require_member(&db_tx, group_id, user_id).await?;

                let expense = self.require_expense(&db_tx, group_id, expense_id).await?;

                let deltas = clear_deltas(expense.amount, &expense.paid_by, &expense.members)?;
                let mut ledger = self.load_ledger(&db_tx, group_id).await?;
                ledger.apply(&deltas)?;
                self.persist_balances(&db_tx, &ledger, deltas.keys()).await?;

                expenses::Entity::delete_by_id(expense_id.to_string())
                    .exec(&db_tx)
                    .await?;

                let total = groups::ActiveModel {
                    id: ActiveValue::Set(group_id.to_string()),
                    total_expenditure_minor: ActiveValue::Set(
                        group_model.total_expenditure_minor - expense.amount.cents(),
                    ),
                    ..Default::default()
                };
                total.update(&db_tx).await?;

                Ok(())
            }
            .await
        })
    }

    /// Returns a single expense. Caller must be a member of its group.
    pub async fn expense(
        &self,
        group_id: &str,
        expense_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Expense> {
        self.require_group(self.database(), group_id).await?;
        self.require_member(self.database(), group_id, user_id)
            .await?;
        self.require_expense(self.database(), group_id, expense_id)
            .await
    }

    /// Lists a group's expenses, newest first.
    pub async fn group_expenses(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> ResultEngine<Vec<Expense>> {
        self.require_group(self.database(), group_id).await?;
        self.require_member(self.database(), group_id, user_id)
            .await?;

        let models = expenses::Entity::find()
            .filter(expenses::Column::GroupId.eq(group_id))
            .order_by_desc(expenses::Column::Date)
            .all(self.database())
            .await?;
        models.into_iter().map(Expense::try_from).collect()
    }

    /// Lists expenses the user participates in across all their groups,
    /// newest first. `limit` caps the result (used by the recent-expenses
    /// view).
    pub async fn user_expenses(
        &self,
        user_id: &str,
        limit: Option<u64>,
    ) -> ResultEngine<Vec<Expense>> {
        let group_ids: Vec<String> = crate::ledger::Entity::find()
            .filter(crate::ledger::Column::MemberId.eq(user_id))
            .all(self.database())
            .await?
            .into_iter()
            .map(|m| m.group_id)
            .collect();

        // The participation check reads the JSON member column, so the cap
        // must come after it. Capping the query itself would count rows the
        // user is not part of against the limit.
        let models = expenses::Entity::find()
            .filter(expenses::Column::GroupId.is_in(group_ids))
            .order_by_desc(expenses::Column::Date)
            .all(self.database())
            .await?;
        let mut result = Vec::new();
        for model in models {
            let expense = Expense::try_from(model)?;
            if expense.members.iter().any(|m| m == user_id) {
                result.push(expense);
            }
            if limit.is_some_and(|limit| result.len() as u64 >= limit) {
                break;
            }
        }
        Ok(result)
    }

    async fn require_expense<C: sea_orm::ConnectionTrait>(
        &self,
        db: &C,
        group_id: &str,
        expense_id: Uuid,
    ) -> ResultEngine<Expense> {
        let model = expenses::Entity::find_by_id(expense_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;
        if model.group_id != group_id {
            return Err(EngineError::KeyNotFound("expense not exists".to_string()));
        }
        Expense::try_from(model)
    }
}
