//! Free-text transaction parsing.
//!
//! A [`TransactionParser`] is the collaborator that turns a sentence into the
//! JSON shape
//!
//! ```json
//! { "payer": "...", "totalAmount": 100000,
//!   "splits": { "<member id>": "<amount>" },
//!   "description": "...", "reasoning": "..." }
//! ```
//!
//! The engine never trusts that shape: [`ParsedTransaction::from_json`] reads
//! it field by field and leaves missing or malformed values empty, for
//! validation to report.
//!
//! [`QuickParser`] is the built-in rule-based parser. It understands
//! `"<payer> paid <amount> for <description> [with <a>, <b> and <c>]"`.

use std::{future::Future, str::FromStr};

use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::{
    Currency, Member, MemberId, Money,
    allocation::{RawSplit, allocate_even},
    util::fold_name,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("nothing to parse")]
    Empty,
    #[error("expected \"<payer> paid <amount> for <description>\": {0}")]
    Unrecognized(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("no member named \"{0}\"")]
    UnknownMember(String),
    #[error("\"{0}\" matches more than one member")]
    AmbiguousMember(String),
    #[error("malformed parser response: {0}")]
    Malformed(String),
    #[error("parser unavailable: {0}")]
    Unavailable(String),
}

/// Input of a parser call.
#[derive(Clone, Debug)]
pub struct ParseRequest {
    pub text: String,
    pub members: Vec<Member>,
    pub acting_user: MemberId,
    pub currency: Currency,
}

pub trait TransactionParser: Send + Sync {
    /// Returns the raw collaborator response.
    fn parse(&self, request: &ParseRequest)
    -> impl Future<Output = Result<Value, ParseError>> + Send;
}

/// Parser output after defensive decoding.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTransaction {
    pub payer: Option<MemberId>,
    /// Total as text; `None` when missing or not a number.
    pub total_amount: Option<String>,
    pub splits: Vec<RawSplit>,
    pub description: String,
    pub reasoning: Option<String>,
}

impl ParsedTransaction {
    /// Reads a collaborator response. Only a non-object response is an
    /// error; anything else degrades to empty fields.
    pub fn from_json(value: &Value) -> Result<Self, ParseError> {
        let object = value
            .as_object()
            .ok_or_else(|| ParseError::Malformed("expected a JSON object".to_string()))?;

        let payer = object
            .get("payer")
            .and_then(Value::as_str)
            .and_then(|s| MemberId::parse(s).ok());
        let total_amount = object
            .get("totalAmount")
            .or_else(|| object.get("total_amount"))
            .and_then(amount_text);
        let splits = object
            .get("splits")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(member, amount)| {
                        Some(RawSplit {
                            member_id: MemberId::parse(member).ok()?,
                            amount: amount_text(amount).unwrap_or_default(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        let description = object
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        let reasoning = object
            .get("reasoning")
            .and_then(Value::as_str)
            .map(ToString::to_string);

        Ok(Self {
            payer,
            total_amount,
            splits,
            description,
            reasoning,
        })
    }
}

fn amount_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => n.as_i64().map(|v| v.to_string()).or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0)
                .and_then(|f| Decimal::try_from(f).ok())
                .and_then(|d| d.to_i64())
                .map(|v| v.to_string())
        }),
        _ => None,
    }
}

/// Rule-based parser for short sentences.
///
/// - `I`/`me` is the acting user.
/// - Names match member ids or display names, ignoring case and diacritics;
///   a unique first name is enough.
/// - Amounts accept `k` (thousand) and `m`/`tr` (million) suffixes.
/// - Without `with`, or with `with everyone`, the whole roster shares.
/// - The total is split evenly over the payer and the named members; the
///   payer absorbs the remainder.
#[derive(Clone, Copy, Debug, Default)]
pub struct QuickParser;

impl QuickParser {
    pub fn parse_text(&self, request: &ParseRequest) -> Result<Value, ParseError> {
        let words: Vec<&str> = request.text.split_whitespace().collect();
        if words.is_empty() {
            return Err(ParseError::Empty);
        }

        let paid = words
            .iter()
            .position(|w| w.eq_ignore_ascii_case("paid"))
            .filter(|idx| *idx > 0)
            .ok_or_else(|| ParseError::Unrecognized("missing \"paid\"".to_string()))?;
        let amount_word = words
            .get(paid + 1)
            .ok_or_else(|| ParseError::Unrecognized("missing amount".to_string()))?;
        if !words
            .get(paid + 2)
            .is_some_and(|w| w.eq_ignore_ascii_case("for"))
        {
            return Err(ParseError::Unrecognized("missing \"for\"".to_string()));
        }

        let rest = &words[paid + 3..];
        let with = rest.iter().rposition(|w| w.eq_ignore_ascii_case("with"));
        let (description, shared_with) = match with {
            Some(idx) => (&rest[..idx], Some(rest[idx + 1..].join(" "))),
            None => (rest, None),
        };

        let payer = self.resolve(&words[..paid].join(" "), request)?;
        let total = parse_amount_word(amount_word, request.currency)?;

        let mut participants = vec![payer.id.clone()];
        match shared_with {
            Some(names) if names.trim().is_empty() => {
                return Err(ParseError::Unrecognized(
                    "missing members after \"with\"".to_string(),
                ));
            }
            Some(names) if !is_everyone(&names) => {
                for name in split_names(&names) {
                    participants.push(self.resolve(&name, request)?.id.clone());
                }
            }
            _ => participants.extend(request.members.iter().map(|m| m.id.clone())),
        }

        let splits = allocate_even(total, &payer.id, &participants)
            .map_err(|e| ParseError::InvalidAmount(e.to_string()))?;
        let shares = splits.len();

        Ok(json!({
            "payer": payer.id.as_str(),
            "totalAmount": total.minor(),
            "splits": splits
                .iter()
                .map(|s| (s.member_id.to_string(), Value::String(s.amount.minor().to_string())))
                .collect::<serde_json::Map<_, _>>(),
            "description": description.join(" "),
            "reasoning": format!(
                "{} paid {}, split evenly between {shares} member(s)",
                payer.display_name,
                total.format(request.currency)
            ),
        }))
    }

    fn resolve<'r>(&self, name: &str, request: &'r ParseRequest) -> Result<&'r Member, ParseError> {
        let folded = fold_name(name);
        if matches!(folded.as_str(), "i" | "me" | "myself") {
            return request
                .members
                .iter()
                .find(|m| m.id == request.acting_user)
                .ok_or_else(|| ParseError::UnknownMember(name.to_string()));
        }

        let exact: Vec<&Member> = request
            .members
            .iter()
            .filter(|m| fold_name(&m.display_name) == folded || fold_name(m.id.as_str()) == folded)
            .collect();
        let candidates: Vec<&Member> = if exact.is_empty() {
            request
                .members
                .iter()
                .filter(|m| {
                    fold_name(&m.display_name)
                        .split(' ')
                        .next()
                        .is_some_and(|first| first == folded)
                })
                .collect()
        } else {
            exact
        };

        match candidates.as_slice() {
            [member] => Ok(*member),
            [] => Err(ParseError::UnknownMember(name.to_string())),
            _ => Err(ParseError::AmbiguousMember(name.to_string())),
        }
    }
}

impl TransactionParser for QuickParser {
    fn parse(
        &self,
        request: &ParseRequest,
    ) -> impl Future<Output = Result<Value, ParseError>> + Send {
        std::future::ready(self.parse_text(request))
    }
}

fn is_everyone(names: &str) -> bool {
    matches!(
        fold_name(names).as_str(),
        "everyone" | "everybody" | "all" | "all of us"
    )
}

/// `"An, Bình and Chi"` -> `["An", "Bình", "Chi"]`.
fn split_names(names: &str) -> Vec<String> {
    let mut out = Vec::new();
    for part in names.split(',') {
        let mut current: Vec<&str> = Vec::new();
        for word in part.split_whitespace() {
            if word.eq_ignore_ascii_case("and") || word == "&" {
                if !current.is_empty() {
                    out.push(current.join(" "));
                    current.clear();
                }
            } else {
                current.push(word);
            }
        }
        if !current.is_empty() {
            out.push(current.join(" "));
        }
    }
    out
}

/// `"150k"`, `"1.5m"`, `"2tr"`, `"100.000"`, `"120000đ"`.
fn parse_amount_word(word: &str, currency: Currency) -> Result<Money, ParseError> {
    let invalid = || ParseError::InvalidAmount(word.to_string());

    let lower = word.to_lowercase();
    let trimmed = ["vnd", "đ", "₫"]
        .iter()
        .find_map(|suffix| lower.strip_suffix(suffix))
        .unwrap_or(&lower);

    let multiplier: i64 = if trimmed.ends_with("tr") || trimmed.ends_with('m') {
        1_000_000
    } else if trimmed.ends_with('k') {
        1_000
    } else {
        return Money::parse_major(trimmed, currency).map_err(|_| invalid());
    };

    let number = trimmed.trim_end_matches(char::is_alphabetic).replace(',', ".");
    let scale = 10i64.pow(u32::from(currency.minor_units()));
    let value = Decimal::from_str(&number).map_err(|_| invalid())?;
    let minor = value
        .checked_mul(Decimal::from(multiplier))
        .and_then(|v| v.checked_mul(Decimal::from(scale)))
        .filter(|v| v.fract().is_zero())
        .and_then(|v| v.to_i64())
        .ok_or_else(invalid)?;
    Ok(Money::new(minor))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rstest::rstest;

    use super::*;

    fn request(text: &str) -> ParseRequest {
        ParseRequest {
            text: text.to_string(),
            members: vec![
                Member::new(MemberId::from("an"), "An", Utc::now()),
                Member::new(MemberId::from("binh"), "Bình Nguyễn", Utc::now()),
                Member::new(MemberId::from("chi"), "Chi", Utc::now()),
            ],
            acting_user: MemberId::from("an"),
            currency: Currency::Vnd,
        }
    }

    fn parsed(text: &str) -> ParsedTransaction {
        let value = QuickParser.parse_text(&request(text)).unwrap();
        ParsedTransaction::from_json(&value).unwrap()
    }

    fn split_amounts(parsed: &ParsedTransaction) -> Vec<(&str, &str)> {
        parsed
            .splits
            .iter()
            .map(|s| (s.member_id.as_str(), s.amount.as_str()))
            .collect()
    }

    #[test]
    fn parses_named_participants() {
        let parsed = parsed("I paid 100k for dinner with binh and Chi");

        assert_eq!(parsed.payer, Some(MemberId::from("an")));
        assert_eq!(parsed.total_amount.as_deref(), Some("100000"));
        assert_eq!(parsed.description, "dinner");
        assert_eq!(
            split_amounts(&parsed),
            vec![("an", "66666"), ("binh", "-33333"), ("chi", "-33333")]
        );
    }

    #[test]
    fn without_participants_everyone_shares() {
        let parsed = parsed("Binh paid 90.000 for taxi to the airport");

        assert_eq!(parsed.payer, Some(MemberId::from("binh")));
        assert_eq!(parsed.description, "taxi to the airport");
        assert_eq!(
            split_amounts(&parsed),
            vec![("an", "-30000"), ("binh", "60000"), ("chi", "-30000")]
        );
    }

    #[test]
    fn last_with_separates_description_from_members() {
        let parsed = parsed("chi paid 60k for coffee with milk with me");
        assert_eq!(parsed.description, "coffee with milk");
        assert_eq!(split_amounts(&parsed), vec![("an", "-30000"), ("chi", "30000")]);
    }

    #[rstest]
    #[case("150k", 150_000)]
    #[case("1.5m", 1_500_000)]
    #[case("2tr", 2_000_000)]
    #[case("1,2tr", 1_200_000)]
    #[case("100.000", 100_000)]
    #[case("120000đ", 120_000)]
    #[case("45000vnd", 45_000)]
    fn amount_suffixes(#[case] word: &str, #[case] expected: i64) {
        assert_eq!(
            parse_amount_word(word, Currency::Vnd).unwrap(),
            Money::new(expected)
        );
    }

    #[test]
    fn amounts_follow_currency_minor_units() {
        assert_eq!(parse_amount_word("12.50", Currency::Usd).unwrap(), Money::new(1_250));
        assert_eq!(parse_amount_word("1.5k", Currency::Eur).unwrap(), Money::new(150_000));
        assert!(parse_amount_word("1.2345k", Currency::Vnd).is_err());
    }

    #[rstest]
    #[case::empty("   ", ParseError::Empty)]
    #[case::no_verb("dinner 100k", ParseError::Unrecognized("missing \"paid\"".to_string()))]
    #[case::no_for("I paid 100k dinner", ParseError::Unrecognized("missing \"for\"".to_string()))]
    #[case::bad_amount("I paid lots for dinner", ParseError::InvalidAmount("lots".to_string()))]
    #[case::stranger("Dung paid 10k for tea", ParseError::UnknownMember("Dung".to_string()))]
    fn parse_failures(#[case] text: &str, #[case] expected: ParseError) {
        assert_eq!(QuickParser.parse_text(&request(text)).unwrap_err(), expected);
    }

    #[test]
    fn ambiguous_first_names_are_rejected() {
        let mut req = request("Binh paid 10k for tea");
        req.members = vec![
            Member::new(MemberId::from("u1"), "Bình Nguyễn", Utc::now()),
            Member::new(MemberId::from("u2"), "Bình Trần", Utc::now()),
        ];
        assert_eq!(
            QuickParser.parse_text(&req).unwrap_err(),
            ParseError::AmbiguousMember("Binh".to_string())
        );
    }

    #[test]
    fn from_json_is_lenient() {
        let value = json!({
            "payer": 42,
            "totalAmount": "not a number",
            "splits": { "an": 50000, "binh": "-25000", "chi": null, "": "1" },
            "reasoning": "guess"
        });
        let parsed = ParsedTransaction::from_json(&value).unwrap();

        assert_eq!(parsed.payer, None);
        assert_eq!(parsed.total_amount.as_deref(), Some("not a number"));
        assert_eq!(parsed.description, "");
        assert_eq!(
            split_amounts(&parsed),
            vec![("an", "50000"), ("binh", "-25000"), ("chi", "")]
        );
        assert!(matches!(
            ParsedTransaction::from_json(&json!([1, 2])),
            Err(ParseError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn trait_call_matches_sync_parse() {
        let req = request("me paid 30k for snacks with chi");
        let value = QuickParser.parse(&req).await.unwrap();
        assert_eq!(value, QuickParser.parse_text(&req).unwrap());
    }
}
