//! Net balances of a fund.
//!
//! Balances are never stored: they are a fold over the transaction history,
//! summing every split amount into its member's entry. Addition commutes, so
//! the order of the history does not matter.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{MemberId, MemberRef, Money, Roster, Split, Transaction};

/// Member balances of one fund. Positive means the member is owed money.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalanceSheet {
    balances: BTreeMap<MemberId, Money>,
}

impl BalanceSheet {
    /// An all-zero sheet covering `members`.
    pub fn zeroed<'a>(members: impl IntoIterator<Item = &'a MemberId>) -> Self {
        Self {
            balances: members
                .into_iter()
                .map(|id| (id.clone(), Money::ZERO))
                .collect(),
        }
    }

    /// Adds one split. Members missing from the sheet get an entry.
    #[must_use]
    pub fn apply(mut self, split: &Split) -> Self {
        let balance = self.balances.entry(split.member_id.clone()).or_default();
        *balance = balance.saturating_add(split.amount);
        self
    }

    #[must_use]
    pub fn get(&self, member: &MemberId) -> Money {
        self.balances.get(member).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MemberId, Money)> {
        self.balances.iter().map(|(id, amount)| (id, *amount))
    }

    /// Sum over all members. Zero whenever every applied transaction was
    /// zero-sum.
    #[must_use]
    pub fn total(&self) -> Money {
        self.balances.values().sum()
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.balances.values().all(|amount| amount.is_zero())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Pairs each balance with its member resolved against `roster`.
    pub fn resolve<'r>(&self, roster: &'r Roster) -> Vec<(MemberRef<'r>, Money)> {
        self.iter()
            .map(|(id, amount)| (roster.resolve(id), amount))
            .collect()
    }
}

impl FromIterator<(MemberId, Money)> for BalanceSheet {
    fn from_iter<T: IntoIterator<Item = (MemberId, Money)>>(iter: T) -> Self {
        Self {
            balances: iter.into_iter().collect(),
        }
    }
}

/// Folds the history of a fund into a [`BalanceSheet`].
///
/// Every member in `members` appears in the output, even without
/// transactions. Voided transactions are skipped. Unbalanced input is summed
/// as-is.
pub fn compute_balances<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
    members: impl IntoIterator<Item = &'a MemberId>,
) -> BalanceSheet {
    transactions
        .into_iter()
        .filter(|tx| !tx.is_voided())
        .flat_map(|tx| tx.splits.iter())
        .fold(BalanceSheet::zeroed(members), BalanceSheet::apply)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::{Currency, SplitKind};

    fn tx(splits: &[(&str, i64)]) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            fund_id: "fund".to_string(),
            description: "test".to_string(),
            total_amount: Money::new(splits.iter().map(|(_, a)| a.max(&0)).sum()),
            currency: Currency::Vnd,
            paid_by: MemberId::from(splits[0].0),
            split_kind: SplitKind::Custom,
            splits: splits
                .iter()
                .map(|(m, a)| Split::new(MemberId::from(*m), Money::new(*a)))
                .collect(),
            created_by: MemberId::from(splits[0].0),
            created_at: Utc::now(),
            voided_at: None,
            voided_by: None,
        }
    }

    fn members(names: &[&str]) -> Vec<MemberId> {
        names.iter().map(|n| MemberId::from(*n)).collect()
    }

    #[test]
    fn every_member_appears_even_without_history() {
        let sheet = compute_balances(std::iter::empty::<&Transaction>(), &members(&["a", "b"]));
        assert_eq!(sheet.len(), 2);
        assert!(sheet.is_settled());
    }

    #[test]
    fn sums_splits_per_member() {
        let history = [
            tx(&[("a", 66_666), ("b", -33_333), ("c", -33_333)]),
            tx(&[("b", 30_000), ("a", -30_000)]),
        ];
        let sheet = compute_balances(&history, &members(&["a", "b", "c", "d"]));

        assert_eq!(sheet.get(&MemberId::from("a")), Money::new(36_666));
        assert_eq!(sheet.get(&MemberId::from("b")), Money::new(-3_333));
        assert_eq!(sheet.get(&MemberId::from("c")), Money::new(-33_333));
        assert_eq!(sheet.get(&MemberId::from("d")), Money::ZERO);
        assert_eq!(sheet.total(), Money::ZERO);
    }

    #[test]
    fn voided_transactions_do_not_count() {
        let mut voided = tx(&[("a", 500), ("b", -500)]);
        voided.voided_at = Some(Utc::now());
        let sheet = compute_balances(&[voided], &members(&["a", "b"]));
        assert!(sheet.is_settled());
    }

    #[test]
    fn departed_members_are_kept_and_resolve_unknown() {
        let history = [tx(&[("a", 100), ("gone", -100)])];
        let ids = members(&["a"]);
        let sheet = compute_balances(&history, &ids);
        let roster = Roster::new([crate::Member::new(MemberId::from("a"), "A", Utc::now())]);

        let resolved = sheet.resolve(&roster);
        assert_eq!(resolved.len(), 2);
        assert!(resolved.iter().any(|(m, amount)| !m.is_known() && *amount == Money::new(-100)));
    }

    #[test]
    fn unbalanced_input_is_summed_faithfully() {
        let sheet = compute_balances(&[tx(&[("a", 100), ("b", -90)])], &members(&["a", "b"]));
        assert_eq!(sheet.total(), Money::new(10));
    }

    #[test]
    fn huge_balances_saturate() {
        let history = [tx(&[("a", i64::MAX), ("b", -i64::MAX)]), tx(&[("a", 5), ("b", -5)])];
        let sheet = compute_balances(&history, &members(&["a", "b"]));
        assert_eq!(sheet.get(&MemberId::from("a")), Money::new(i64::MAX));
        assert_eq!(sheet.get(&MemberId::from("b")), Money::new(i64::MIN));
    }
}
