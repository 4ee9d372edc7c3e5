//! The module contains the `Group` struct and its storage model.
//!
//! A group is the unit of expense sharing: it owns a ledger (one
//! [`BalanceEntry`](crate::BalanceEntry) per member, stored in
//! `balance_entries`), its expenses and its settlement history.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, MoneyCents};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Stable identifier (UUID string), generated once at creation.
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub currency: Currency,
    /// Username of the creating member. The owner is always a group member.
    pub owner: String,
    pub category: Option<String>,
    /// Running sum of all live expense amounts, maintained by the expense
    /// ops (add increases it, delete and the edited-away half of an update
    /// decrease it).
    pub total_expenditure: MoneyCents,
}

impl Group {
    pub fn new(
        name: String,
        description: Option<String>,
        currency: Currency,
        owner: String,
        category: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            description,
            currency,
            owner,
            category,
            total_expenditure: MoneyCents::ZERO,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub currency: String,
    pub owner: String,
    pub category: Option<String>,
    pub total_expenditure_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ledger::Entity")]
    BalanceEntries,
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
    #[sea_orm(has_many = "super::settlements::Entity")]
    Settlements,
}

impl Related<super::ledger::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BalanceEntries.def()
    }
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl Related<super::settlements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Settlements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Group> for ActiveModel {
    fn from(group: &Group) -> Self {
        Self {
            id: ActiveValue::Set(group.id.clone()),
            name: ActiveValue::Set(group.name.clone()),
            description: ActiveValue::Set(group.description.clone()),
            currency: ActiveValue::Set(group.currency.code().to_string()),
            owner: ActiveValue::Set(group.owner.clone()),
            category: ActiveValue::Set(group.category.clone()),
            total_expenditure_minor: ActiveValue::Set(group.total_expenditure.cents()),
        }
    }
}

impl TryFrom<Model> for Group {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            name: model.name,
            description: model.description,
            currency: Currency::try_from(model.currency.as_str()).unwrap_or_default(),
            owner: model.owner,
            category: model.category,
            total_expenditure: MoneyCents::new(model.total_expenditure_minor),
        })
    }
}
