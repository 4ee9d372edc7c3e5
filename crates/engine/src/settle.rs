//! Settlement reducer: balance vector -> minimal transfer list.
//!
//! Pure computation over an ordered snapshot of a group's ledger. Two phases,
//! in this order (the order changes the output, and the output is part of the
//! API contract):
//!
//! 1. **Exact matches**: pair off members whose balances cancel exactly and
//!    settle each pair with a single transfer.
//! 2. **Greedy**: repeatedly match the largest creditor with the largest
//!    debtor and settle `min(credit, |debt|)`, until one side runs out.
//!
//! Each greedy iteration zeroes at least one member, so the loop runs at most
//! `n - 1` times; both phases are `O(n^2)` scans.
//!
//! A snapshot whose total carries the per-expense rounding remainder (see
//! [`crate::split`]) leaves that residue on one side after phase 2; the
//! reducer never emits a zero or negative transfer for it.

use serde::{Deserialize, Serialize};

use crate::{EngineError, MoneyCents, ResultEngine};

/// A suggested point-to-point payment: `from` pays `to`. `amount` is always
/// positive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub amount: MoneyCents,
}

/// Reduces a balance vector to the transfers that settle it.
///
/// `balances` must be in the ledger's stable entry order; the scan order of
/// both phases (and therefore tie-breaking) follows it.
pub fn reduce(balances: &[(String, MoneyCents)]) -> Vec<Transfer> {
    let mut working: Vec<MoneyCents> = balances.iter().map(|(_, amount)| *amount).collect();
    let mut transfers = Vec::new();

    exact_matches(balances, &mut working, &mut transfers);
    greedy_settle(balances, &mut working, &mut transfers);

    transfers
}

/// Phase 1: settle pairs whose balances cancel exactly.
///
/// Each member is considered once as the outer element and matched at most
/// once. Zero balances never match (a transfer of 0 is never emitted).
fn exact_matches(
    balances: &[(String, MoneyCents)],
    working: &mut [MoneyCents],
    transfers: &mut Vec<Transfer>,
) {
    for a in 0..working.len() {
        if working[a].is_zero() {
            continue;
        }
        for b in (a + 1)..working.len() {
            if working[b].is_zero() {
                continue;
            }
            if (working[a] + working[b]).is_zero() {
                let (debtor, creditor) = if working[a].is_negative() {
                    (a, b)
                } else {
                    (b, a)
                };
                transfers.push(Transfer {
                    from: balances[debtor].0.clone(),
                    to: balances[creditor].0.clone(),
                    amount: working[a].abs(),
                });
                working[a] = MoneyCents::ZERO;
                working[b] = MoneyCents::ZERO;
                break;
            }
        }
    }
}

/// Phase 2: largest creditor vs largest debtor, strict comparisons so the
/// first occurrence wins ties.
fn greedy_settle(
    balances: &[(String, MoneyCents)],
    working: &mut [MoneyCents],
    transfers: &mut Vec<Transfer>,
) {
    loop {
        let mut max_creditor: Option<usize> = None;
        let mut max_debtor: Option<usize> = None;
        let mut max_credit = MoneyCents::ZERO;
        let mut max_debt = MoneyCents::ZERO;

        for (index, balance) in working.iter().enumerate() {
            if balance.is_positive() && *balance > max_credit {
                max_credit = *balance;
                max_creditor = Some(index);
            }
            if balance.is_negative() && *balance < max_debt {
                max_debt = *balance;
                max_debtor = Some(index);
            }
        }

        let (Some(creditor), Some(debtor)) = (max_creditor, max_debtor) else {
            break;
        };

        let settle = max_credit.min(max_debt.abs());
        transfers.push(Transfer {
            from: balances[debtor].0.clone(),
            to: balances[creditor].0.clone(),
            amount: settle,
        });
        working[debtor] += settle;
        working[creditor] -= settle;
    }
}

/// Post-check for a reducer run.
///
/// Replays `transfers` against `balances` and verifies the residue: after a
/// correct reduction the remaining balances all carry the same sign (the
/// rounding residue of the snapshot, possibly zero). Residues of both signs
/// mean the reducer failed to settle members it should have settled, an
/// engine bug, reported as [`EngineError::InvariantViolation`].
pub fn verify_transfers(
    balances: &[(String, MoneyCents)],
    transfers: &[Transfer],
) -> ResultEngine<()> {
    let mut residue: Vec<(String, MoneyCents)> = balances.to_vec();

    for transfer in transfers {
        if !transfer.amount.is_positive() {
            return Err(EngineError::InvariantViolation(format!(
                "non-positive transfer of {} from {} to {}",
                transfer.amount, transfer.from, transfer.to
            )));
        }
        for (member, amount) in &mut residue {
            if *member == transfer.from {
                *amount += transfer.amount;
            } else if *member == transfer.to {
                *amount -= transfer.amount;
            }
        }
    }

    let any_positive = residue.iter().any(|(_, a)| a.is_positive());
    let any_negative = residue.iter().any(|(_, a)| a.is_negative());
    if any_positive && any_negative {
        tracing::error!(?residue, "settlement reduction left opposite residues");
        return Err(EngineError::InvariantViolation(
            "settlement reduction left both creditors and debtors".to_string(),
        ));
    }
    Ok(())
}
