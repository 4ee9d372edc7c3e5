//! Per-group balance ledger.
//!
//! A [`Ledger`] holds one [`BalanceEntry`] per group member: a signed running
//! total in minor units. Positive means the group owes the member, negative
//! means the member owes the group. Entry order is member insertion order and
//! is stable; the settlement reducer's scan order depends on it.
//!
//! Every change to balances goes through [`Ledger::apply`], which is
//! all-or-nothing: the whole delta map is validated before any entry is
//! touched.

use std::collections::HashMap;

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, MoneyCents, ResultEngine};

/// Derived side of a balance: `Owed` iff the amount is >= 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceStatus {
    Owed,
    Owes,
}

impl BalanceStatus {
    pub fn from_amount(amount: MoneyCents) -> Self {
        if amount.is_negative() {
            Self::Owes
        } else {
            Self::Owed
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owed => "owed",
            Self::Owes => "owes",
        }
    }
}

/// One member's signed running total within a group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub member_id: String,
    pub amount: MoneyCents,
    pub status: BalanceStatus,
}

impl BalanceEntry {
    /// Fresh entry for a member that just joined (amount 0).
    pub fn new(member_id: String) -> Self {
        Self {
            member_id,
            amount: MoneyCents::ZERO,
            status: BalanceStatus::Owed,
        }
    }
}

/// A group's balance vector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ledger {
    pub group_id: String,
    entries: Vec<BalanceEntry>,
}

impl Ledger {
    pub fn new(group_id: String) -> Self {
        Self {
            group_id,
            entries: Vec::new(),
        }
    }

    /// Rebuilds a ledger from already-ordered entries (storage order).
    pub fn from_entries(group_id: String, entries: Vec<BalanceEntry>) -> Self {
        Self { group_id, entries }
    }

    pub fn entries(&self) -> &[BalanceEntry] {
        &self.entries
    }

    pub fn contains(&self, member_id: &str) -> bool {
        self.entries.iter().any(|e| e.member_id == member_id)
    }

    pub fn balance_of(&self, member_id: &str) -> Option<MoneyCents> {
        self.entries
            .iter()
            .find(|e| e.member_id == member_id)
            .map(|e| e.amount)
    }

    /// Sum of all entries. Effectively zero for a healthy ledger, modulo the
    /// per-expense rounding remainder documented in [`crate::split`].
    pub fn total_balance(&self) -> MoneyCents {
        self.entries
            .iter()
            .fold(MoneyCents::ZERO, |acc, e| acc + e.amount)
    }

    /// Ordered read-only copy of the balance vector for the reducer.
    pub fn snapshot(&self) -> Vec<(String, MoneyCents)> {
        self.entries
            .iter()
            .map(|e| (e.member_id.clone(), e.amount))
            .collect()
    }

    /// Adds a zero-balance entry for a new member.
    pub fn add_member(&mut self, member_id: &str) -> ResultEngine<()> {
        if self.contains(member_id) {
            return Err(EngineError::ExistingMember(member_id.to_string()));
        }
        self.entries.push(BalanceEntry::new(member_id.to_string()));
        Ok(())
    }

    /// Removes a member's entry. Refused while the member's balance is not
    /// exactly zero.
    pub fn remove_member(&mut self, member_id: &str) -> ResultEngine<()> {
        let index = self
            .entries
            .iter()
            .position(|e| e.member_id == member_id)
            .ok_or_else(|| EngineError::MemberNotInGroup(member_id.to_string()))?;
        if !self.entries[index].amount.is_zero() {
            return Err(EngineError::NonZeroBalance(format!(
                "{member_id} still has a balance of {}",
                self.entries[index].amount
            )));
        }
        self.entries.remove(index);
        Ok(())
    }

    /// Applies a delta per member, all-or-nothing.
    ///
    /// Every key in `deltas` must name an existing entry; otherwise nothing
    /// is applied and [`EngineError::MemberNotInGroup`] is returned. On
    /// success each touched entry has its amount shifted and its status
    /// recomputed.
    pub fn apply(&mut self, deltas: &HashMap<String, MoneyCents>) -> ResultEngine<()> {
        for member_id in deltas.keys() {
            if !self.contains(member_id) {
                return Err(EngineError::MemberNotInGroup(member_id.clone()));
            }
        }

        let expected_total = deltas
            .values()
            .fold(self.total_balance(), |acc, d| acc + *d);

        for entry in &mut self.entries {
            if let Some(delta) = deltas.get(&entry.member_id) {
                entry.amount += *delta;
                entry.status = BalanceStatus::from_amount(entry.amount);
            }
        }

        // Internal sanity check: the new total must equal the old total plus
        // the delta sum. A mismatch is an engine bug, not a caller error.
        let total = self.total_balance();
        if total != expected_total {
            tracing::error!(
                group_id = %self.group_id,
                expected = expected_total.cents(),
                actual = total.cents(),
                "ledger total drifted during apply"
            );
            return Err(EngineError::InvariantViolation(format!(
                "group {}: total {} != expected {}",
                self.group_id, total, expected_total
            )));
        }

        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "balance_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub group_id: String,
    pub member_id: String,
    pub amount_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id"
    )]
    Groups,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for BalanceEntry {
    fn from(model: Model) -> Self {
        let amount = MoneyCents::new(model.amount_minor);
        Self {
            member_id: model.member_id,
            amount,
            status: BalanceStatus::from_amount(amount),
        }
    }
}

impl BalanceEntry {
    /// Active model for inserting this entry into a group.
    pub(crate) fn active_model(&self, group_id: &str) -> ActiveModel {
        ActiveModel {
            id: ActiveValue::NotSet,
            group_id: ActiveValue::Set(group_id.to_string()),
            member_id: ActiveValue::Set(self.member_id.clone()),
            amount_minor: ActiveValue::Set(self.amount.cents()),
        }
    }
}
