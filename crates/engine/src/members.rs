//! Fund members.
//!
//! A [`MemberId`] is an opaque identity used as a map key across the engine.
//! A [`Roster`] is the member list of one fund; it is the universe over which
//! balances are computed.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ResultEngine, fund_members, util::normalize_member_id};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    /// Builds a validated id: trimmed, non-empty.
    pub fn parse(value: &str) -> ResultEngine<Self> {
        normalize_member_id(value).map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for MemberId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for MemberId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub display_name: String,
    pub joined_at: DateTime<Utc>,
}

impl Member {
    pub fn new(id: MemberId, display_name: impl Into<String>, joined_at: DateTime<Utc>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            joined_at,
        }
    }
}

impl From<fund_members::Model> for Member {
    fn from(model: fund_members::Model) -> Self {
        Self {
            id: MemberId::from(model.member_id),
            display_name: model.display_name,
            joined_at: model.joined_at,
        }
    }
}

/// A member reference resolved against a roster.
///
/// History may mention members that have since left the fund; those come
/// back as `Unknown` and callers must render them explicitly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemberRef<'a> {
    Known(&'a Member),
    Unknown(MemberId),
}

impl MemberRef<'_> {
    #[must_use]
    pub fn id(&self) -> &MemberId {
        match self {
            MemberRef::Known(member) => &member.id,
            MemberRef::Unknown(id) => id,
        }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        matches!(self, MemberRef::Known(_))
    }

    /// Known members render with their display name, unknown ones with their
    /// raw id in brackets.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            MemberRef::Known(member) => member.display_name.clone(),
            MemberRef::Unknown(id) => format!("[{id}]"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Roster {
    members: BTreeMap<MemberId, Member>,
}

impl Roster {
    pub fn new(members: impl IntoIterator<Item = Member>) -> Self {
        Self {
            members: members.into_iter().map(|m| (m.id.clone(), m)).collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, id: &MemberId) -> bool {
        self.members.contains_key(id)
    }

    #[must_use]
    pub fn resolve(&self, id: &MemberId) -> MemberRef<'_> {
        match self.members.get(id) {
            Some(member) => MemberRef::Known(member),
            None => MemberRef::Unknown(id.clone()),
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &MemberId> {
        self.members.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Roster {
        Roster::new([
            Member::new(MemberId::from("an"), "An", Utc::now()),
            Member::new(MemberId::from("binh"), "Bình", Utc::now()),
        ])
    }

    #[test]
    fn resolves_known_members() {
        let roster = roster();
        let resolved = roster.resolve(&MemberId::from("binh"));
        assert!(resolved.is_known());
        assert_eq!(resolved.label(), "Bình");
    }

    #[test]
    fn departed_members_resolve_to_unknown() {
        let roster = roster();
        let resolved = roster.resolve(&MemberId::from("dung"));
        assert_eq!(resolved, MemberRef::Unknown(MemberId::from("dung")));
        assert_eq!(resolved.label(), "[dung]");
    }

    #[test]
    fn parse_trims_and_rejects_blank_ids() {
        assert_eq!(MemberId::parse("  an ").unwrap(), MemberId::from("an"));
        assert!(MemberId::parse("   ").is_err());
    }
}
