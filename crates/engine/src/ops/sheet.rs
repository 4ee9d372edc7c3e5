//! Balance sheet: read-only snapshot plus settlement reduction.

use crate::{
    MoneyCents, ResultEngine,
    ledger::BalanceEntry,
    settle::{self, Transfer},
};

use super::Engine;

impl Engine {
    /// Ordered read-only copy of a group's balance vector.
    pub async fn snapshot(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> ResultEngine<Vec<(String, MoneyCents)>> {
        self.require_group(self.database(), group_id).await?;
        self.require_member(self.database(), group_id, user_id)
            .await?;
        let ledger = self.load_ledger(self.database(), group_id).await?;
        Ok(ledger.snapshot())
    }

    /// Computes the group's balance sheet: the current balance vector and
    /// the minimal transfers that would settle it.
    ///
    /// Pure read; runs concurrently with anything except the group's own
    /// in-flight mutation (which commits atomically, so the snapshot is
    /// always a consistent state). The reduction is re-verified before being
    /// returned; a failed verification is an engine bug surfacing as
    /// `InvariantViolation`.
    pub async fn balance_sheet(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> ResultEngine<(Vec<BalanceEntry>, Vec<Transfer>)> {
        self.require_group(self.database(), group_id).await?;
        self.require_member(self.database(), group_id, user_id)
            .await?;

        let ledger = self.load_ledger(self.database(), group_id).await?;
        let snapshot = ledger.snapshot();
        let transfers = settle::reduce(&snapshot);
        settle::verify_transfers(&snapshot, &transfers)?;

        Ok((ledger.entries().to_vec(), transfers))
    }

    /// Sum of all balance entries of a group. Diagnostic: effectively zero
    /// for a healthy ledger, modulo per-expense rounding remainders.
    pub async fn total_balance(&self, group_id: &str) -> ResultEngine<MoneyCents> {
        self.require_group(self.database(), group_id).await?;
        let ledger = self.load_ledger(self.database(), group_id).await?;
        Ok(ledger.total_balance())
    }
}
