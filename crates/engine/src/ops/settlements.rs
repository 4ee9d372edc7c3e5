//! Settlement recording: the second write path into the ledger, independent
//! of what the reducer suggests.

use chrono::{DateTime, Utc};
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    MoneyCents, ResultEngine,
    settlements::{self, Settlement},
};

use super::{Engine, with_tx};

impl Engine {
    /// Records that `settle_from` paid `settle_to` outside the system.
    ///
    /// Adjusts both balances through the ledger and appends an immutable
    /// settlement record, in one locked transaction. Both parties must be
    /// group members, as must the acting user.
    pub async fn record_settlement(
        &self,
        group_id: &str,
        user_id: &str,
        settle_from: &str,
        settle_to: &str,
        amount: MoneyCents,
        settled_at: DateTime<Utc>,
    ) -> ResultEngine<Uuid> {
        let lock = self.group_lock(group_id);
        let _guard = lock.lock().await;

        with_tx!(self, |db_tx| {
            async {
                self.require_group(&db_tx, group_id).await?;
                self.require_member(&db_tx, group_id, user_id).await?;

                let settlement = Settlement::new(
                    group_id.to_string(),
                    settle_from.to_string(),
                    settle_to.to_string(),
                    amount,
                    settled_at,
                )?;

                // Ledger::apply rejects parties without a balance entry, so
                // membership of both sides is enforced here as well.
                let deltas = settlement.deltas();
                let mut ledger = self.load_ledger(&db_tx, group_id).await?;
                ledger.apply(&deltas)?;
                self.persist_balances(&db_tx, &ledger, deltas.keys()).await?;

                settlements::ActiveModel::from(&settlement)
                    .insert(&db_tx)
                    .await?;
                Ok(settlement.id)
            }
            .await
        })
    }

    /// Lists a group's recorded settlements, newest first.
    pub async fn group_settlements(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> ResultEngine<Vec<Settlement>> {
        self.require_group(self.database(), group_id).await?;
        self.require_member(self.database(), group_id, user_id)
            .await?;

        let models = settlements::Entity::find()
            .filter(settlements::Column::GroupId.eq(group_id))
            .order_by_desc(settlements::Column::SettledAt)
            .all(self.database())
            .await?;
        models.into_iter().map(Settlement::try_from).collect()
    }
}
