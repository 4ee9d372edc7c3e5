//! Expense split computation.
//!
//! Turns an expense event (amount, payer, member list) into a per-member
//! delta map for the ledger: the payer is credited the full amount, every
//! member (payer included) is debited one rounded share.
//!
//! Because the share is rounded to the cent, `members * share` can differ
//! from the amount by a few cents. That remainder stays on the payer's
//! balance, reproducing the historical behavior, so a ledger
//! total can drift within a single expense's rounding. [`clear_deltas`]
//! reverses the same rounded share, so add-then-clear is an exact inverse and
//! the drift never compounds across edit cycles.

use std::collections::{HashMap, HashSet};

use crate::{EngineError, MoneyCents, ResultEngine, money};

/// Delta map for adding an expense: payer `+amount`, each member `-share`.
///
/// Errors: `InvalidAmount` when `amount <= 0`, `InvalidMemberCount` when
/// `members` is empty, `InvalidSplit` when the payer is not in `members` or
/// when `members` names someone twice (a duplicate would inflate the divisor
/// and debit that member two shares).
pub fn split_deltas(
    amount: MoneyCents,
    payer: &str,
    members: &[String],
) -> ResultEngine<HashMap<String, MoneyCents>> {
    if !amount.is_positive() {
        return Err(EngineError::InvalidAmount(format!(
            "expense amount must be > 0, got {amount}"
        )));
    }
    if members.is_empty() {
        return Err(EngineError::InvalidMemberCount(
            "expense needs at least one member".to_string(),
        ));
    }
    if !members.iter().any(|m| m == payer) {
        return Err(EngineError::InvalidSplit(format!(
            "payer {payer} is not among the expense members"
        )));
    }
    let mut seen = HashSet::new();
    if let Some(duplicate) = members.iter().find(|m| !seen.insert(m.as_str())) {
        return Err(EngineError::InvalidSplit(format!(
            "member {duplicate} is listed more than once"
        )));
    }

    let share = money::share(amount, members.len())?;

    let mut deltas: HashMap<String, MoneyCents> = HashMap::new();
    deltas.insert(payer.to_string(), amount);
    for member in members {
        *deltas.entry(member.clone()).or_insert(MoneyCents::ZERO) -= share;
    }
    Ok(deltas)
}

/// Exact algebraic inverse of [`split_deltas`] for the same expense.
///
/// Must be called with the *original* expense's amount/payer/members when
/// reversing an edit or delete.
pub fn clear_deltas(
    amount: MoneyCents,
    payer: &str,
    members: &[String],
) -> ResultEngine<HashMap<String, MoneyCents>> {
    let mut deltas = split_deltas(amount, payer, members)?;
    for delta in deltas.values_mut() {
        *delta = -*delta;
    }
    Ok(deltas)
}

/// Merges delta maps by summing per-member amounts, dropping members whose
/// merged delta nets to zero.
///
/// Editing an expense is `merge(clear(old), split(new))` applied as a single
/// ledger mutation, so no intermediate half-edited state is ever visible or
/// persisted.
pub fn merge_deltas(
    mut base: HashMap<String, MoneyCents>,
    other: HashMap<String, MoneyCents>,
) -> HashMap<String, MoneyCents> {
    for (member, delta) in other {
        *base.entry(member).or_insert(MoneyCents::ZERO) += delta;
    }
    base.retain(|_, delta| !delta.is_zero());
    base
}
