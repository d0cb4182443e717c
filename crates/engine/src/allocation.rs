//! Split allocation.
//!
//! Turns a total, a payer and a [`SplitStrategy`] into signed [`Split`]s.
//!
//! Only [`SplitStrategy::Even`] and [`SplitStrategy::Percentage`] compute
//! amounts, and their output is always zero-sum. `Custom` and `AiDerived`
//! splits are passed through untouched and must go through validation.
//!
//! # Remainder policy (even split)
//!
//! Every participant owes `floor(total / n)`. The `total % n` leftover units
//! are owed by the payer when the payer is a participant, otherwise by the
//! first participants in the given order, one unit each.
//!
//! # Remainder policy (percentage split)
//!
//! Largest remainder: floored shares first, then one leftover unit per share
//! in order of the biggest dropped fraction.

use std::{collections::HashSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{EngineError, MemberId, Money, ResultEngine, Split, SplitKind};

/// A percentage with two decimals, stored in hundredths of a percent
/// (`10_000` is 100%).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percent(u32);

impl Percent {
    pub const HUNDRED: Percent = Percent(10_000);

    pub fn from_hundredths(value: u32) -> ResultEngine<Self> {
        if value > Self::HUNDRED.0 {
            return Err(EngineError::InvalidSplit(
                "percentage must be between 0 and 100".to_string(),
            ));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub const fn hundredths(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Percent {
    type Err = EngineError;

    /// Parses `"33.33"`, `"50"`, `"12,5"` or `"25%"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidSplit(format!("invalid percentage: {s}"));

        let trimmed = s.trim().trim_end_matches('%').trim().replace(',', ".");
        let (whole, frac) = match trimmed.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (trimmed.as_str(), ""),
        };
        if whole.is_empty()
            || whole.len() > 3
            || frac.len() > 2
            || !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }
        let whole: u32 = whole.parse().map_err(|_| invalid())?;
        let frac: u32 = if frac.is_empty() {
            0
        } else {
            format!("{frac:0<2}").parse().map_err(|_| invalid())?
        };
        Self::from_hundredths(whole * 100 + frac)
    }
}

/// One member's percentage in a percentage split.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PercentShare {
    pub member_id: MemberId,
    pub percent: Percent,
}

/// An unparsed split amount, as produced by the transaction parser.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSplit {
    pub member_id: MemberId,
    pub amount: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum SplitStrategy {
    /// Share the total evenly between `participants` (the payer may or may
    /// not be one of them).
    Even { participants: Vec<MemberId> },
    /// Share the total by percentages summing to exactly 100%.
    Percentage { shares: Vec<PercentShare> },
    /// Caller-provided signed splits, validated but never computed.
    Custom { splits: Vec<Split> },
    /// Splits returned by the transaction parser, converted but never
    /// rebalanced.
    AiDerived { splits: Vec<RawSplit> },
}

impl SplitStrategy {
    pub fn kind(&self) -> SplitKind {
        match self {
            Self::Even { .. } => SplitKind::Even,
            Self::Percentage { .. } => SplitKind::Percentage,
            Self::Custom { .. } => SplitKind::Custom,
            Self::AiDerived { .. } => SplitKind::AiDerived,
        }
    }

    /// Whether the strategy derives amounts from the total and the payer.
    pub fn computes_amounts(&self) -> bool {
        matches!(self, Self::Even { .. } | Self::Percentage { .. })
    }
}

/// Produces the splits for `strategy`.
pub fn allocate(total: Money, payer: &MemberId, strategy: &SplitStrategy) -> ResultEngine<Vec<Split>> {
    match strategy {
        SplitStrategy::Even { participants } => allocate_even(total, payer, participants),
        SplitStrategy::Percentage { shares } => allocate_percentage(total, payer, shares),
        SplitStrategy::Custom { splits } => Ok(splits.clone()),
        SplitStrategy::AiDerived { splits } => Ok(convert_raw_splits(splits)),
    }
}

/// Even split. See the module docs for the remainder policy.
pub fn allocate_even(
    total: Money,
    payer: &MemberId,
    participants: &[MemberId],
) -> ResultEngine<Vec<Split>> {
    ensure_positive_total(total)?;
    let participants = dedup(participants);
    if participants.is_empty() {
        return Err(EngineError::InvalidSplit(
            "even split needs at least one participant".to_string(),
        ));
    }

    let count = i64::try_from(participants.len())
        .map_err(|_| EngineError::InvalidSplit("too many participants".to_string()))?;
    let share = total.minor() / count;
    let remainder = total.minor() % count;
    let payer_participates = participants.contains(&payer);

    let mut owed: Vec<(MemberId, i64)> = participants
        .iter()
        .map(|member| ((*member).clone(), share))
        .collect();
    if payer_participates {
        if let Some((_, amount)) = owed.iter_mut().find(|(member, _)| member == payer) {
            *amount += remainder;
        }
    } else {
        for (_, amount) in owed.iter_mut().take(remainder as usize) {
            *amount += 1;
        }
    }

    Ok(credit_payer(total, payer, owed))
}

/// Percentage split.
///
/// Owed amounts are floored, then the leftover units go one each to the
/// shares with the largest dropped fractions (input order on ties). Every
/// owed amount stays within one unit of its exact share, so nobody holding a
/// percentage ends up being owed money.
pub fn allocate_percentage(
    total: Money,
    payer: &MemberId,
    shares: &[PercentShare],
) -> ResultEngine<Vec<Split>> {
    ensure_positive_total(total)?;
    if shares.is_empty() {
        return Err(EngineError::InvalidSplit(
            "percentage split needs at least one share".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    if let Some(dup) = shares.iter().find(|s| !seen.insert(&s.member_id)) {
        return Err(EngineError::InvalidSplit(format!(
            "member {} appears more than once",
            dup.member_id
        )));
    }

    let percent_total: u32 = shares.iter().map(|s| s.percent.hundredths()).sum();
    if percent_total != Percent::HUNDRED.hundredths() {
        return Err(EngineError::InvalidSplit(format!(
            "percentages must sum to 100%, got {}",
            Percent(percent_total)
        )));
    }

    let scale = i128::from(Percent::HUNDRED.hundredths());
    let total_wide = i128::from(total.minor());
    let mut owed: Vec<(MemberId, i64)> = Vec::with_capacity(shares.len());
    let mut fractions: Vec<(usize, i128)> = Vec::with_capacity(shares.len());
    for (idx, share) in shares.iter().enumerate() {
        let scaled = total_wide * i128::from(share.percent.hundredths());
        let amount = i64::try_from(scaled / scale)
            .map_err(|_| EngineError::InvalidAmount("amount too large".to_string()))?;
        owed.push((share.member_id.clone(), amount));
        fractions.push((idx, scaled % scale));
    }

    // Below `shares.len()`: each dropped fraction is less than one unit.
    let leftover = total.minor() - owed.iter().map(|(_, amount)| amount).sum::<i64>();
    fractions.sort_by_key(|(_, fraction)| std::cmp::Reverse(*fraction));
    for (idx, _) in fractions.into_iter().take(usize::try_from(leftover).unwrap_or(0)) {
        owed[idx].1 += 1;
    }

    Ok(credit_payer(total, payer, owed))
}

/// Converts parser output into splits. Unparsable amounts become 0 and the
/// result is never rebalanced.
pub fn convert_raw_splits(raw: &[RawSplit]) -> Vec<Split> {
    raw.iter()
        .map(|r| {
            let amount = r.amount.parse::<Money>().unwrap_or(Money::ZERO);
            Split::new(r.member_id.clone(), amount)
        })
        .collect()
}

fn ensure_positive_total(total: Money) -> ResultEngine<()> {
    if !total.is_positive() {
        return Err(EngineError::InvalidAmount(
            "total amount must be > 0".to_string(),
        ));
    }
    Ok(())
}

fn dedup(members: &[MemberId]) -> Vec<&MemberId> {
    let mut seen = HashSet::new();
    members.iter().filter(|m| seen.insert(*m)).collect()
}

/// Payer first (credited with the full total minus their own share), then
/// every other participant with their owed amount negated.
fn credit_payer(total: Money, payer: &MemberId, owed: Vec<(MemberId, i64)>) -> Vec<Split> {
    let payer_owes: i64 = owed
        .iter()
        .filter(|(member, _)| member == payer)
        .map(|(_, amount)| amount)
        .sum();

    let mut splits = Vec::with_capacity(owed.len() + 1);
    splits.push(Split::new(payer.clone(), Money::new(total.minor() - payer_owes)));
    splits.extend(
        owed.into_iter()
            .filter(|(member, _)| member != payer)
            .map(|(member, amount)| Split::new(member, Money::new(-amount))),
    );
    splits
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::splits_sum;

    fn ids(names: &[&str]) -> Vec<MemberId> {
        names.iter().map(|n| MemberId::from(*n)).collect()
    }

    fn amounts(splits: &[Split]) -> Vec<(&str, i64)> {
        splits
            .iter()
            .map(|s| (s.member_id.as_str(), s.amount.minor()))
            .collect()
    }

    fn share(member: &str, percent: &str) -> PercentShare {
        PercentShare {
            member_id: MemberId::from(member),
            percent: percent.parse().unwrap(),
        }
    }

    #[test]
    fn even_split_payer_absorbs_remainder() {
        let splits = allocate_even(
            Money::new(100_000),
            &MemberId::from("a"),
            &ids(&["a", "b", "c"]),
        )
        .unwrap();

        assert_eq!(
            amounts(&splits),
            vec![("a", 66_666), ("b", -33_333), ("c", -33_333)]
        );
        assert_eq!(splits_sum(&splits), Money::ZERO);
    }

    #[test]
    fn even_split_for_others_spreads_remainder_in_order() {
        let splits = allocate_even(
            Money::new(100_001),
            &MemberId::from("a"),
            &ids(&["b", "c"]),
        )
        .unwrap();

        assert_eq!(
            amounts(&splits),
            vec![("a", 100_001), ("b", -50_001), ("c", -50_000)]
        );
    }

    #[test]
    fn even_split_ignores_duplicate_participants() {
        let splits =
            allocate_even(Money::new(90), &MemberId::from("a"), &ids(&["b", "b", "c"])).unwrap();
        assert_eq!(amounts(&splits), vec![("a", 90), ("b", -45), ("c", -45)]);
    }

    #[test]
    fn even_split_payer_alone_nets_to_zero() {
        let splits = allocate_even(Money::new(50), &MemberId::from("a"), &ids(&["a"])).unwrap();
        assert_eq!(amounts(&splits), vec![("a", 0)]);
    }

    #[rstest]
    #[case::zero_total(0, &["a", "b"])]
    #[case::negative_total(-10, &["a", "b"])]
    #[case::no_participants(100, &[])]
    fn even_split_rejects_bad_input(#[case] total: i64, #[case] participants: &[&str]) {
        let result = allocate_even(Money::new(total), &MemberId::from("a"), &ids(participants));
        assert!(result.is_err());
    }

    #[test]
    fn percentage_split_hands_leftover_to_largest_fraction() {
        // 33.333, 33.333 and 33.34 floor to 33 each; c drops the most.
        let splits = allocate_percentage(
            Money::new(100),
            &MemberId::from("a"),
            &[share("a", "33.33"), share("b", "33.33"), share("c", "33.34")],
        )
        .unwrap();

        assert_eq!(amounts(&splits), vec![("a", 67), ("b", -33), ("c", -34)]);
        assert_eq!(splits_sum(&splits), Money::ZERO);
    }

    #[test]
    fn percentage_split_breaks_fraction_ties_by_order() {
        // 1_001 * 50% = 500.5 for both shares; the single leftover unit goes
        // to the first share.
        let splits = allocate_percentage(
            Money::new(1_001),
            &MemberId::from("p"),
            &[share("b", "50"), share("c", "50")],
        )
        .unwrap();
        assert_eq!(amounts(&splits), vec![("p", 1_001), ("b", -501), ("c", -500)]);
    }

    #[test]
    fn percentage_split_never_credits_a_share_holder() {
        let shares = [
            share("m0", "16.67"),
            share("m1", "16.67"),
            share("m2", "16.67"),
            share("m3", "16.67"),
            share("m4", "16.67"),
            share("last", "16.65"),
        ];
        let splits = allocate_percentage(Money::new(3), &MemberId::from("p"), &shares).unwrap();

        assert_eq!(
            amounts(&splits),
            vec![
                ("p", 3),
                ("m0", -1),
                ("m1", -1),
                ("m2", -1),
                ("m3", 0),
                ("m4", 0),
                ("last", 0)
            ]
        );
        assert!(splits.iter().skip(1).all(|s| !s.amount.is_positive()));
    }

    #[test]
    fn percentage_split_requires_hundred_percent() {
        let err = allocate_percentage(
            Money::new(100),
            &MemberId::from("a"),
            &[share("a", "50"), share("b", "40")],
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidSplit("percentages must sum to 100%, got 90.00%".to_string())
        );
    }

    #[test]
    fn percentage_split_rejects_duplicates() {
        let result = allocate_percentage(
            Money::new(100),
            &MemberId::from("a"),
            &[share("b", "50"), share("b", "50")],
        );
        assert!(matches!(result, Err(EngineError::InvalidSplit(_))));
    }

    #[test]
    fn percent_parsing() {
        assert_eq!("33.33".parse::<Percent>().unwrap().hundredths(), 3333);
        assert_eq!("12,5".parse::<Percent>().unwrap().hundredths(), 1250);
        assert_eq!("25%".parse::<Percent>().unwrap().hundredths(), 2500);
        assert_eq!("100".parse::<Percent>().unwrap(), Percent::HUNDRED);
        assert!("100.01".parse::<Percent>().is_err());
        assert!("1.234".parse::<Percent>().is_err());
        assert!("-5".parse::<Percent>().is_err());
        assert!("".parse::<Percent>().is_err());
        assert_eq!(Percent::from_hundredths(3333).unwrap().to_string(), "33.33%");
    }

    #[test]
    fn custom_splits_pass_through_unbalanced() {
        let splits = vec![
            Split::new(MemberId::from("a"), Money::new(10_000)),
            Split::new(MemberId::from("b"), Money::new(-9_000)),
        ];
        let out = allocate(
            Money::new(10_000),
            &MemberId::from("a"),
            &SplitStrategy::Custom {
                splits: splits.clone(),
            },
        )
        .unwrap();
        assert_eq!(out, splits);
    }

    #[test]
    fn raw_splits_treat_garbage_as_zero() {
        let raw = vec![
            RawSplit {
                member_id: MemberId::from("a"),
                amount: "60000".to_string(),
            },
            RawSplit {
                member_id: MemberId::from("b"),
                amount: "-30.000".to_string(),
            },
            RawSplit {
                member_id: MemberId::from("c"),
                amount: "about thirty".to_string(),
            },
        ];
        assert_eq!(
            amounts(&convert_raw_splits(&raw)),
            vec![("a", 60_000), ("b", -30_000), ("c", 0)]
        );
    }
}
