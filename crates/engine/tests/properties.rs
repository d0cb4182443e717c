use chrono::Utc;
use engine::{
    Currency, MemberId, Money, Percent, PercentShare, Split, SplitKind,
    Transaction, ValidationConfig, Validator, allocate_even, allocate_percentage,
    compute_balances, settle, splits_sum,
};
use proptest::prelude::*;
use uuid::Uuid;

fn member(idx: usize) -> MemberId {
    MemberId::from(format!("u{idx}"))
}

fn members(count: usize) -> Vec<MemberId> {
    (0..count).map(member).collect()
}

fn even_tx(total: i64, payer: usize, participants: &[usize]) -> Transaction {
    let payer = member(payer);
    let participants: Vec<MemberId> = participants.iter().copied().map(member).collect();
    let splits = allocate_even(Money::new(total), &payer, &participants)
        .expect("positive total with participants");
    Transaction {
        id: Uuid::new_v4(),
        fund_id: "f".to_string(),
        description: "lunch".to_string(),
        total_amount: Money::new(total),
        currency: Currency::Vnd,
        paid_by: payer.clone(),
        split_kind: SplitKind::Even,
        splits,
        created_by: payer,
        created_at: Utc::now(),
        voided_at: None,
        voided_by: None,
    }
}

/// Weights scaled to hundredths of a percent summing to exactly 100%.
fn shares_from_weights(weights: &[u32]) -> Vec<PercentShare> {
    let weight_total: u32 = weights.iter().sum();
    let mut hundredths: Vec<u32> = weights
        .iter()
        .map(|w| w * Percent::HUNDRED.hundredths() / weight_total)
        .collect();
    let assigned: u32 = hundredths.iter().sum();
    if let Some(last) = hundredths.last_mut() {
        *last += Percent::HUNDRED.hundredths() - assigned;
    }
    hundredths
        .into_iter()
        .enumerate()
        .map(|(idx, value)| PercentShare {
            member_id: member(idx),
            percent: Percent::from_hundredths(value).expect("at most 100%"),
        })
        .collect()
}

prop_compose! {
    fn history(max_members: usize)(
        member_count in 2usize..=max_members,
    )(
        txs in prop::collection::vec(
            (1i64..=10_000_000, 0usize..member_count, prop::collection::vec(0usize..member_count, 1..=member_count)),
            0..=20,
        ),
        member_count in Just(member_count),
    ) -> (usize, Vec<Transaction>) {
        let txs = txs
            .into_iter()
            .map(|(total, payer, participants)| even_tx(total, payer, &participants))
            .collect();
        (member_count, txs)
    }
}

fn shuffled_history(
    max_members: usize,
) -> impl Strategy<Value = (usize, Vec<Transaction>, Vec<Transaction>)> {
    history(max_members).prop_flat_map(|(member_count, txs)| {
        (Just(member_count), Just(txs.clone()), Just(txs).prop_shuffle())
    })
}

proptest! {
    #[test]
    fn even_allocation_sums_to_zero(
        total in 1i64..=1_000_000_000,
        payer in 0usize..6,
        participants in prop::collection::vec(0usize..6, 1..=6),
    ) {
        let tx = even_tx(total, payer, &participants);
        prop_assert_eq!(splits_sum(&tx.splits), Money::ZERO);

        let owed: i64 = tx.splits.iter().filter(|s| s.amount.is_negative()).map(|s| -s.amount.minor()).sum();
        let payer_owes = tx.total_amount.minor() - tx.amount_for(&tx.paid_by).minor();
        prop_assert_eq!(owed + payer_owes, total);
    }

    #[test]
    fn percentage_allocation_sums_to_zero(
        total in 1i64..=1_000_000_000,
        weights in prop::collection::vec(1u32..=100, 1..=6),
        payer in 0usize..8,
    ) {
        let shares = shares_from_weights(&weights);
        let splits = allocate_percentage(Money::new(total), &member(payer), &shares)
            .expect("shares sum to 100%");
        prop_assert_eq!(splits_sum(&splits), Money::ZERO);
    }

    #[test]
    fn percentage_shares_never_credit_non_payers(
        total in 1i64..=1_000_000_000,
        weights in prop::collection::vec(1u32..=100, 1..=8),
        payer in 0usize..10,
    ) {
        let shares = shares_from_weights(&weights);
        let payer = member(payer);
        let splits = allocate_percentage(Money::new(total), &payer, &shares)
            .expect("shares sum to 100%");

        let others = shares.iter().filter(|share| share.member_id != payer);
        for (share, split) in others.zip(splits.iter().skip(1)) {
            prop_assert_eq!(&share.member_id, &split.member_id);
            prop_assert!(!split.amount.is_positive(), "{} credited {}", split.member_id, split.amount);
            let exact = i128::from(total) * i128::from(share.percent.hundredths());
            let owed = -i128::from(split.amount.minor()) * 10_000;
            prop_assert!((owed - exact).abs() < 10_000);
        }
    }

    #[test]
    fn balances_are_conserved((member_count, txs) in history(6)) {
        let ids = members(member_count);
        let sheet = compute_balances(&txs, &ids);
        prop_assert_eq!(sheet.total(), Money::ZERO);
        prop_assert_eq!(sheet.len(), member_count);
    }

    #[test]
    fn balances_ignore_history_order((member_count, txs, shuffled) in shuffled_history(6)) {
        let ids = members(member_count);
        prop_assert_eq!(compute_balances(&txs, &ids), compute_balances(&shuffled, &ids));
    }

    #[test]
    fn voided_transactions_do_not_count(
        (member_count, mut txs) in history(5),
        void_mask in any::<u32>(),
    ) {
        let ids = members(member_count);
        let mut kept = Vec::new();
        for (idx, tx) in txs.iter_mut().enumerate() {
            if void_mask & (1 << (idx % 32)) != 0 {
                tx.voided_at = Some(Utc::now());
            } else {
                kept.push(tx.clone());
            }
        }
        prop_assert_eq!(compute_balances(&txs, &ids), compute_balances(&kept, &ids));
    }

    #[test]
    fn settlement_clears_every_balance((member_count, txs) in history(6)) {
        let ids = members(member_count);
        let sheet = compute_balances(&txs, &ids);
        let transfers = settle(&sheet);

        prop_assert!(transfers.len() < member_count.max(1));
        prop_assert!(transfers.iter().all(|t| t.amount.is_positive()));

        let settled = transfers
            .iter()
            .flat_map(|t| [Split::new(t.from.clone(), t.amount), Split::new(t.to.clone(), -t.amount)])
            .fold(sheet, |sheet, split| sheet.apply(&split));
        prop_assert!(settled.is_settled());
    }

    #[test]
    fn validation_is_idempotent(
        description in ".{0,12}",
        amount in "[0-9.,]{0,12}",
        split_amounts in prop::collection::vec(-1_000i64..=1_000, 0..=4),
    ) {
        let validator = Validator::new(ValidationConfig::default());
        let splits: Vec<Split> = split_amounts
            .iter()
            .enumerate()
            .map(|(idx, amount)| Split::new(member(idx), Money::new(*amount)))
            .collect();

        let first = validator.validate(&description, &amount, &splits);
        let second = validator.validate(&description, &amount, &splits);
        prop_assert_eq!(first, second);
    }
}
