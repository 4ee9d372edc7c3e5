use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Inr,
    Usd,
    Eur,
    Yen,
    Yuan,
}

pub mod group {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupNew {
        pub name: String,
        pub description: Option<String>,
        pub currency: Option<Currency>,
        pub category: Option<String>,
        /// Initial member roster. The creator is always included.
        pub members: Option<Vec<String>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupCreated {
        pub id: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupUpdate {
        pub name: Option<String>,
        pub description: Option<String>,
        pub category: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupView {
        pub id: String,
        pub name: String,
        pub description: Option<String>,
        pub currency: Currency,
        pub owner: String,
        pub category: Option<String>,
        pub total_expenditure_minor: i64,
        pub members: Vec<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupListResponse {
        pub groups: Vec<GroupView>,
    }

    /// Request body for adding a member to an existing group.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberAdd {
        pub member_id: String,
    }
}

pub mod expense {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub group_id: String,
        pub name: String,
        pub description: Option<String>,
        /// Must be > 0, in minor units of the group currency.
        pub amount_minor: i64,
        pub category: Option<String>,
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub date: Option<DateTime<FixedOffset>>,
        pub paid_by: String,
        /// Participants the expense is split between. Must include `paid_by`.
        pub members: Vec<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseCreated {
        pub id: Uuid,
    }

    /// Partial update; absent fields keep their stored value.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseUpdate {
        pub group_id: String,
        pub name: Option<String>,
        pub description: Option<String>,
        pub amount_minor: Option<i64>,
        pub category: Option<String>,
        pub date: Option<DateTime<FixedOffset>>,
        pub paid_by: Option<String>,
        pub members: Option<Vec<String>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: Uuid,
        pub group_id: String,
        pub name: String,
        pub description: Option<String>,
        pub amount_minor: i64,
        pub currency: Currency,
        pub category: Option<String>,
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub date: DateTime<FixedOffset>,
        pub created_by: String,
        pub paid_by: String,
        pub members: Vec<String>,
        /// Rounded per-head share at the time the expense was recorded.
        pub per_member_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseListResponse {
        pub expenses: Vec<ExpenseView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecentExpensesQuery {
        pub limit: Option<u64>,
    }
}

pub mod settlement {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementNew {
        pub group_id: String,
        /// The member paying (the debtor).
        pub settle_from: String,
        /// The member being paid (the creditor).
        pub settle_to: String,
        /// Must be > 0, in minor units of the group currency.
        pub amount_minor: i64,
        /// Optional: if absent, server uses now().
        pub settled_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementView {
        pub id: Uuid,
        pub group_id: String,
        pub settle_from: String,
        pub settle_to: String,
        pub amount_minor: i64,
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub settled_at: DateTime<FixedOffset>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementListResponse {
        pub settlements: Vec<SettlementView>,
    }
}

pub mod sheet {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceView {
        pub member_id: String,
        /// Signed net position: positive means the group owes this member.
        pub amount_minor: i64,
        /// "owed" when the amount is >= 0, "owes" otherwise.
        pub status: String,
    }

    /// One suggested repayment from the settlement reducer.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferView {
        pub from: String,
        pub to: String,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceSheetResponse {
        pub balances: Vec<BalanceView>,
        pub transfers: Vec<TransferView>,
    }
}
