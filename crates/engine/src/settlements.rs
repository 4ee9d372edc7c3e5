//! Settlement records.
//!
//! A settlement is a real-world payment two members agreed on: `settle_from`
//! paid `settle_to` outside the system, and the ledger is adjusted to match.
//! Records are append-only history, independent of whatever the settlement
//! reducer currently suggests.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub id: Uuid,
    pub group_id: String,
    /// The member who paid.
    pub settle_from: String,
    /// The member who received the payment.
    pub settle_to: String,
    pub amount: MoneyCents,
    pub settled_at: DateTime<Utc>,
}

impl Settlement {
    pub fn new(
        group_id: String,
        settle_from: String,
        settle_to: String,
        amount: MoneyCents,
        settled_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "settlement amount must be > 0".to_string(),
            ));
        }
        if settle_from == settle_to {
            return Err(EngineError::InvalidAmount(
                "settle_from and settle_to must differ".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            group_id,
            settle_from,
            settle_to,
            amount,
            settled_at,
        })
    }

    /// Ledger delta realized by this settlement: the payer's balance rises,
    /// the receiver's balance drops.
    pub fn deltas(&self) -> std::collections::HashMap<String, MoneyCents> {
        std::collections::HashMap::from([
            (self.settle_from.clone(), self.amount),
            (self.settle_to.clone(), -self.amount),
        ])
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "settlements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub settle_from: String,
    pub settle_to: String,
    pub amount_minor: i64,
    pub settled_at: DateTimeUtc,
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

impl From<&Settlement> for ActiveModel {
    fn from(settlement: &Settlement) -> Self {
        Self {
            id: ActiveValue::Set(settlement.id.to_string()),
            group_id: ActiveValue::Set(settlement.group_id.clone()),
            settle_from: ActiveValue::Set(settlement.settle_from.clone()),
            settle_to: ActiveValue::Set(settlement.settle_to.clone()),
            amount_minor: ActiveValue::Set(settlement.amount.cents()),
            settled_at: ActiveValue::Set(settlement.settled_at),
        }
    }
}

impl TryFrom<Model> for Settlement {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("settlement not exists".to_string()))?,
            group_id: model.group_id,
            settle_from: model.settle_from,
            settle_to: model.settle_to,
            amount: MoneyCents::new(model.amount_minor),
            settled_at: model.settled_at,
        })
    }
}
