//! Debt simplification.
//!
//! Greedy matching of the largest debtor with the largest creditor until one
//! side runs out. Each step zeroes at least one member, so a fund of `n`
//! members settles in at most `n - 1` transfers.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::{BalanceSheet, MemberId, Money};

/// One suggested payment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: MemberId,
    pub to: MemberId,
    pub amount: Money,
}

/// Suggests transfers that bring every balance of `sheet` to zero.
///
/// Ties are broken by member id so the output is deterministic. Every
/// transfer amount is positive.
pub fn settle(sheet: &BalanceSheet) -> Vec<Transfer> {
    let mut debtors: Vec<(MemberId, i64)> = Vec::new();
    let mut creditors: Vec<(MemberId, i64)> = Vec::new();
    for (member, amount) in sheet.iter() {
        if amount.is_negative() {
            debtors.push((member.clone(), amount.minor().saturating_neg()));
        } else if amount.is_positive() {
            creditors.push((member.clone(), amount.minor()));
        }
    }
    // Largest amounts first; `sort_by_key` is stable so id order breaks ties.
    debtors.sort_by_key(|(_, owed)| Reverse(*owed));
    creditors.sort_by_key(|(_, owed)| Reverse(*owed));

    let mut transfers = Vec::with_capacity(debtors.len().max(creditors.len()));
    let (mut d, mut c) = (0, 0);
    while d < debtors.len() && c < creditors.len() {
        let amount = debtors[d].1.min(creditors[c].1);
        transfers.push(Transfer {
            from: debtors[d].0.clone(),
            to: creditors[c].0.clone(),
            amount: Money::new(amount),
        });
        debtors[d].1 -= amount;
        creditors[c].1 -= amount;
        if debtors[d].1 == 0 {
            d += 1;
        }
        if creditors[c].1 == 0 {
            c += 1;
        }
    }
    transfers
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rstest::rstest;

    use super::*;

    fn sheet(balances: &[(&str, i64)]) -> BalanceSheet {
        balances
            .iter()
            .map(|(m, a)| (MemberId::from(*m), Money::new(*a)))
            .collect()
    }

    fn transfer(from: &str, to: &str, amount: i64) -> Transfer {
        Transfer {
            from: MemberId::from(from),
            to: MemberId::from(to),
            amount: Money::new(amount),
        }
    }

    #[rstest]
    #[case::one_creditor(
        &[("a", 300), ("b", -100), ("c", -200)],
        vec![transfer("c", "a", 200), transfer("b", "a", 100)]
    )]
    #[case::one_debtor(
        &[("a", -300), ("b", 100), ("c", 200)],
        vec![transfer("a", "c", 200), transfer("a", "b", 100)]
    )]
    #[case::chain(
        &[("a", 500), ("b", -200), ("c", -400), ("d", 100)],
        vec![transfer("c", "a", 400), transfer("b", "a", 100), transfer("b", "d", 100)]
    )]
    #[case::settled(&[("a", 0), ("b", 0)], vec![])]
    #[case::empty(&[], vec![])]
    fn greedy_settlement(#[case] balances: &[(&str, i64)], #[case] expected: Vec<Transfer>) {
        assert_eq!(settle(&sheet(balances)), expected);
    }

    #[test]
    fn ties_break_on_member_id() {
        let transfers = settle(&sheet(&[("x", 100), ("b", -50), ("a", -50)]));
        assert_eq!(transfers, vec![transfer("a", "x", 50), transfer("b", "x", 50)]);
    }

    #[test]
    fn transfers_clear_every_balance() {
        let balances = [("a", 1_234), ("b", -999), ("c", 765), ("d", -1_000), ("e", 0)];
        let sheet = sheet(&balances);
        let transfers = settle(&sheet);

        assert!(transfers.len() < balances.len());
        assert!(transfers.iter().all(|t| t.amount.is_positive() && t.from != t.to));

        let mut net: BTreeMap<MemberId, Money> = sheet.iter().map(|(m, a)| (m.clone(), a)).collect();
        for t in &transfers {
            *net.entry(t.from.clone()).or_default() += t.amount;
            *net.entry(t.to.clone()).or_default() -= t.amount;
        }
        assert!(net.values().all(|a| a.is_zero()));
    }
}
