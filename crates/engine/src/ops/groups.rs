//! Group lifecycle and membership ops.

use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    Currency, EngineError, ResultEngine, expenses,
    groups::{self, Group},
    ledger::{self, BalanceEntry},
    settlements,
};

use super::{Engine, normalize_optional_text, normalize_required_name, with_tx};

impl Engine {
    /// Creates a group with a zero-balance ledger entry per member.
    ///
    /// The owner is always a member; if absent from `members` it is added
    /// first. Duplicate names in `members` are collapsed.
    pub async fn new_group(
        &self,
        name: &str,
        description: Option<&str>,
        currency: Option<Currency>,
        category: Option<&str>,
        owner: &str,
        members: &[String],
    ) -> ResultEngine<String> {
        let name = normalize_required_name(name, "group")?;
        let group = Group::new(
            name,
            normalize_optional_text(description),
            currency.unwrap_or_default(),
            owner.to_string(),
            normalize_optional_text(category),
        );

        let mut roster: Vec<String> = vec![owner.to_string()];
        for member in members {
            if !roster.iter().any(|m| m == member) {
                roster.push(member.clone());
            }
        }

        let group_id = group.id.clone();
        with_tx!(self, |db_tx| {
            async {
                groups::ActiveModel::from(&group).insert(&db_tx).await?;
                for member in &roster {
                    BalanceEntry::new(member.clone())
                        .active_model(&group_id)
                        .insert(&db_tx)
                        .await?;
                }
                Ok(group_id.clone())
            }
            .await
        })
    }

    /// Returns a group with its current balance vector. Caller must be a
    /// member.
    pub async fn group(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> ResultEngine<(Group, Vec<BalanceEntry>)> {
        let model = self.require_group(self.database(), group_id).await?;
        self.require_member(self.database(), group_id, user_id)
            .await?;
        let ledger = self.load_ledger(self.database(), group_id).await?;
        Ok((Group::try_from(model)?, ledger.entries().to_vec()))
    }

    /// Lists every group the user belongs to.
    pub async fn groups_for_user(&self, user_id: &str) -> ResultEngine<Vec<Group>> {
        let memberships = ledger::Entity::find()
            .filter(ledger::Column::MemberId.eq(user_id))
            .order_by_asc(ledger::Column::Id)
            .all(self.database())
            .await?;

        let mut result = Vec::with_capacity(memberships.len());
        for membership in memberships {
            if let Some(model) = groups::Entity::find_by_id(membership.group_id)
                .one(self.database())
                .await?
            {
                result.push(Group::try_from(model)?);
            }
        }
        Ok(result)
    }

    /// Updates group metadata. Owner only.
    pub async fn update_group(
        &self,
        group_id: &str,
        user_id: &str,
        name: Option<&str>,
        description: Option<&str>,
        category: Option<&str>,
    ) -> ResultEngine<()> {
        let model = self.require_group(self.database(), group_id).await?;
        if model.owner != user_id {
            return Err(EngineError::Forbidden(
                "only the group owner can edit the group".to_string(),
            ));
        }

        let mut active = groups::ActiveModel {
            id: ActiveValue::Set(group_id.to_string()),
            ..Default::default()
        };
        if let Some(name) = name {
            active.name = ActiveValue::Set(normalize_required_name(name, "group")?);
        }
        if description.is_some() {
            active.description = ActiveValue::Set(normalize_optional_text(description));
        }
        if category.is_some() {
            active.category = ActiveValue::Set(normalize_optional_text(category));
        }
        active.update(self.database()).await?;
        Ok(())
    }

    /// Deletes a group and everything it owns (expenses, settlements,
    /// balance entries). Owner only.
    pub async fn delete_group(&self, group_id: &str, user_id: &str) -> ResultEngine<()> {
        let lock = self.group_lock(group_id);
        let _guard = lock.lock().await;

        let result = with_tx!(self, |db_tx| {
            async {
                let model = self.require_group(&db_tx, group_id).await?;
                if model.owner != user_id {
                    return Err(EngineError::Forbidden(
                        "only the group owner can delete the group".to_string(),
                    ));
                }

                expenses::Entity::delete_many()
                    .filter(expenses::Column::GroupId.eq(group_id))
                    .exec(&db_tx)
                    .await?;
                settlements::Entity::delete_many()
                    .filter(settlements::Column::GroupId.eq(group_id))
                    .exec(&db_tx)
                    .await?;
                ledger::Entity::delete_many()
                    .filter(ledger::Column::GroupId.eq(group_id))
                    .exec(&db_tx)
                    .await?;
                groups::Entity::delete_by_id(group_id.to_string())
                    .exec(&db_tx)
                    .await?;
                Ok(())
            }
            .await
        });

        if result.is_ok() {
            self.drop_group_lock(group_id);
        }
        result
    }

    /// Adds a member with a fresh zero balance. Any current member can add.
    pub async fn add_member(
        &self,
        group_id: &str,
        user_id: &str,
        member_id: &str,
    ) -> ResultEngine<()> {
        let lock = self.group_lock(group_id);
        let _guard = lock.lock().await;

        with_tx!(self, |db_tx| {
            async {
                self.require_group(&db_tx, group_id).await?;
                self.require_member(&db_tx, group_id, user_id).await?;

                let mut ledger = self.load_ledger(&db_tx, group_id).await?;
                ledger.add_member(member_id)?;
                BalanceEntry::new(member_id.to_string())
                    .active_model(group_id)
                    .insert(&db_tx)
                    .await?;
                Ok(())
            }
            .await
        })
    }

    /// Removes a member. Refused while the member still owes or is owed
    /// anything.
    pub async fn remove_member(
        &self,
        group_id: &str,
        user_id: &str,
        member_id: &str,
    ) -> ResultEngine<()> {
        let lock = self.group_lock(group_id);
        let _guard = lock.lock().await;

        with_tx!(self, |db_tx| {
            async {
                self.require_group(&db_tx, group_id).await?;
                self.require_member(&db_tx, group_id, user_id).await?;

                let mut ledger = self.load_ledger(&db_tx, group_id).await?;
                ledger.remove_member(member_id)?;
                ledger::Entity::delete_many()
                    .filter(ledger::Column::GroupId.eq(group_id))
                    .filter(ledger::Column::MemberId.eq(member_id))
                    .exec(&db_tx)
                    .await?;
                Ok(())
            }
            .await
        })
    }
}
