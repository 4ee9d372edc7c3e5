//! Expense records.
//!
//! An expense stores the event that produced a ledger delta: who paid, how
//! much, and between whom it was divided. The per-member share is kept
//! denormalized so an expense can be reversed later with the very same
//! rounded figures that were applied.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, MoneyCents, ResultEngine, money};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub group_id: String,
    pub name: String,
    pub description: Option<String>,
    pub amount: MoneyCents,
    pub currency: Currency,
    pub category: Option<String>,
    pub date: DateTime<Utc>,
    pub created_by: String,
    pub paid_by: String,
    /// Members the amount is divided between, in submission order. Always
    /// contains `paid_by`.
    pub members: Vec<String>,
    /// Rounded per-member share, fixed at creation/edit time.
    pub per_member: MoneyCents,
}

impl Expense {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        group_id: String,
        name: String,
        description: Option<String>,
        amount: MoneyCents,
        currency: Currency,
        category: Option<String>,
        date: DateTime<Utc>,
        created_by: String,
        paid_by: String,
        members: Vec<String>,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "expense amount must be > 0".to_string(),
            ));
        }
        let per_member = money::share(amount, members.len())?;
        Ok(Self {
            id: Uuid::new_v4(),
            group_id,
            name,
            description,
            amount,
            currency,
            category,
            date,
            created_by,
            paid_by,
            members,
            per_member,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub name: String,
    pub description: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    pub category: Option<String>,
    pub date: DateTimeUtc,
    pub created_by: String,
    pub paid_by: String,
    /// JSON array of member usernames.
    pub members: String,
    pub per_member_minor: i64,
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

impl TryFrom<&Expense> for ActiveModel {
    type Error = EngineError;

    fn try_from(expense: &Expense) -> Result<Self, Self::Error> {
        let members = serde_json::to_string(&expense.members).map_err(|err| {
            EngineError::InvalidSplit(format!("unserializable member list: {err}"))
        })?;
        Ok(Self {
            id: ActiveValue::Set(expense.id.to_string()),
            group_id: ActiveValue::Set(expense.group_id.clone()),
            name: ActiveValue::Set(expense.name.clone()),
            description: ActiveValue::Set(expense.description.clone()),
            amount_minor: ActiveValue::Set(expense.amount.cents()),
            currency: ActiveValue::Set(expense.currency.code().to_string()),
            category: ActiveValue::Set(expense.category.clone()),
            date: ActiveValue::Set(expense.date),
            created_by: ActiveValue::Set(expense.created_by.clone()),
            paid_by: ActiveValue::Set(expense.paid_by.clone()),
            members: ActiveValue::Set(members),
            per_member_minor: ActiveValue::Set(expense.per_member.cents()),
        })
    }
}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let members: Vec<String> = serde_json::from_str(&model.members)
            .map_err(|_| EngineError::KeyNotFound("expense member list corrupt".to_string()))?;
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("expense not exists".to_string()))?,
            group_id: model.group_id,
            name: model.name,
            description: model.description,
            amount: MoneyCents::new(model.amount_minor),
            currency: Currency::try_from(model.currency.as_str()).unwrap_or_default(),
            category: model.category,
            date: model.date,
            created_by: model.created_by,
            paid_by: model.paid_by,
            members,
            per_member: MoneyCents::new(model.per_member_minor),
        })
    }
}
