use sea_orm::TransactionTrait;
use serde::{Deserialize, Serialize};

use crate::{
    BalanceSheet, Currency, Fund, MemberId, MemberRef, Money, ResultEngine, Transfer,
    compute_balances, settle,
};

use super::{Engine, with_tx};

/// A member's net position, resolved against the current roster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberBalance {
    pub member_id: MemberId,
    /// `None` for members that have left the fund.
    pub display_name: Option<String>,
    pub amount: Money,
}

impl MemberBalance {
    fn from_ref(member: MemberRef<'_>, amount: Money) -> Self {
        match member {
            MemberRef::Known(member) => Self {
                member_id: member.id.clone(),
                display_name: Some(member.display_name.clone()),
                amount,
            },
            MemberRef::Unknown(member_id) => Self {
                member_id,
                display_name: None,
                amount,
            },
        }
    }

    pub fn is_known(&self) -> bool {
        self.display_name.is_some()
    }
}

/// Balances of a fund as computed from its non-voided history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundBalances {
    pub fund_id: String,
    pub currency: Currency,
    pub balances: Vec<MemberBalance>,
}

impl FundBalances {
    /// Zero for any history of zero-sum transactions.
    pub fn total(&self) -> Money {
        self.balances.iter().map(|b| b.amount).sum()
    }
}

impl Engine {
    /// Net balance of every member, recomputed from the history.
    pub async fn balances(&self, fund_id: &str, user_id: &MemberId) -> ResultEngine<FundBalances> {
        let (fund, sheet) = self.balance_sheet(fund_id, user_id).await?;
        let roster = fund.roster();
        let balances = sheet
            .resolve(&roster)
            .into_iter()
            .map(|(member, amount)| MemberBalance::from_ref(member, amount))
            .collect();

        Ok(FundBalances {
            fund_id: fund.id,
            currency: fund.currency,
            balances,
        })
    }

    /// Suggested transfers that settle every balance.
    pub async fn settlement(&self, fund_id: &str, user_id: &MemberId) -> ResultEngine<Vec<Transfer>> {
        let (_, sheet) = self.balance_sheet(fund_id, user_id).await?;
        Ok(settle(&sheet))
    }

    async fn balance_sheet(
        &self,
        fund_id: &str,
        user_id: &MemberId,
    ) -> ResultEngine<(Fund, BalanceSheet)> {
        with_tx!(self, |db_tx| {
            let model = self.require_fund(&db_tx, fund_id, user_id).await?;
            let fund = self.load_fund(&db_tx, model).await?;
            let history = self.load_history(&db_tx, fund_id).await?;
            let member_ids = fund.member_ids();
            let sheet = compute_balances(&history, &member_ids);
            if !sheet.total().is_zero() {
                tracing::warn!(
                    "balances of fund {fund_id} do not sum to zero (off by {})",
                    sheet.total()
                );
            }
            Ok((fund, sheet))
        })
    }
}
