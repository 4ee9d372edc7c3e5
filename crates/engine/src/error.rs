//! The module contains the errors the engine can throw.
//!
//! Most variants are caller errors (bad group, bad member set, bad amount).
//! [`InvariantViolation`] is different: it flags an internal accounting bug
//! (a ledger whose entries stopped adding up) and is never caused by user
//! input.
//!
//! [`InvariantViolation`]: EngineError::InvariantViolation
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("group not found: {0}")]
    GroupNotFound(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("member not in group: {0}")]
    MemberNotInGroup(String),
    #[error("\"{0}\" already present!")]
    ExistingMember(String),
    #[error("invalid member count: {0}")]
    InvalidMemberCount(String),
    #[error("invalid split: {0}")]
    InvalidSplit(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("balance not settled: {0}")]
    NonZeroBalance(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("concurrent modification: {0}")]
    ConcurrentModification(String),
    #[error("ledger invariant violated: {0}")]
    InvariantViolation(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Stable machine-readable code, exposed verbatim by the API layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::GroupNotFound(_) => "group_not_found",
            Self::KeyNotFound(_) => "not_found",
            Self::MemberNotInGroup(_) => "member_not_in_group",
            Self::ExistingMember(_) => "existing_member",
            Self::InvalidMemberCount(_) => "invalid_member_count",
            Self::InvalidSplit(_) => "invalid_split",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::NonZeroBalance(_) => "non_zero_balance",
            Self::Forbidden(_) => "forbidden",
            Self::ConcurrentModification(_) => "concurrent_modification",
            Self::InvariantViolation(_) => "invariant_violation",
            Self::Database(_) => "internal",
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::GroupNotFound(a), Self::GroupNotFound(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::MemberNotInGroup(a), Self::MemberNotInGroup(b)) => a == b,
            (Self::ExistingMember(a), Self::ExistingMember(b)) => a == b,
            (Self::InvalidMemberCount(a), Self::InvalidMemberCount(b)) => a == b,
            (Self::InvalidSplit(a), Self::InvalidSplit(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::NonZeroBalance(a), Self::NonZeroBalance(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::ConcurrentModification(a), Self::ConcurrentModification(b)) => a == b,
            (Self::InvariantViolation(a), Self::InvariantViolation(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
