//! Channel naming for the pub/sub transport.
//!
//! Four disjoint namespaces, each a literal prefix followed by its
//! underscore-delimited key tuple:
//!
//! | Namespace          | Format                                  |
//! |--------------------|-----------------------------------------|
//! | collaborator       | `__col_user_<tableId>`                  |
//! | cell collaborator  | `__col_cell_user_<tableId>_<viewId>`    |
//! | user notification  | `__notification_user_<userId>`          |
//! | action trigger     | `__action_trigger_<tableId>`            |
//!
//! Names are deterministic and injective per namespace as long as ids never
//! contain `_`. Ids are otherwise treated as opaque strings.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{DomainError, ErrorCode, TableId, UserId, ViewId};

const COLLABORATOR_PREFIX: &str = "__col_user_";
const CELL_COLLABORATOR_PREFIX: &str = "__col_cell_user_";
const NOTIFICATION_PREFIX: &str = "__notification_user_";
const ACTION_TRIGGER_PREFIX: &str = "__action_trigger_";
const SEPARATOR: char = '_';

/// A routing address on the pub/sub transport.
///
/// Only produced by the naming functions in this module (or by parsing a
/// string that one of them could have produced).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Channel(String);

/// The namespace a channel belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelNamespace {
    Collaborator,
    CellCollaborator,
    Notification,
    ActionTrigger,
}

/// Key tuple recovered from a channel string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChannelKey {
    Collaborator { table_id: TableId },
    CellCollaborator { table_id: TableId, view_id: ViewId },
    Notification { user_id: UserId },
    ActionTrigger { table_id: TableId },
}

// The constructors are total. An empty id yields a name such as
// `__action_trigger_` that `Channel::parse` rejects, so callers publishing
// on these channels check ids first (see `RealtimeDispatcher`).

/// Presence channel for every collaborator of a table.
pub fn collaborator_channel(table_id: &TableId) -> Channel {
    Channel(format!("{COLLABORATOR_PREFIX}{table_id}"))
}

/// Presence channel for collaborators focused on cells of one view.
pub fn cell_collaborator_channel(table_id: &TableId, view_id: &ViewId) -> Channel {
    Channel(format!("{CELL_COLLABORATOR_PREFIX}{table_id}{SEPARATOR}{view_id}"))
}

/// Per-user notification channel.
pub fn notification_channel(user_id: &UserId) -> Channel {
    Channel(format!("{NOTIFICATION_PREFIX}{user_id}"))
}

/// Per-table channel carrying events and coalesced action triggers.
pub fn action_trigger_channel(table_id: &TableId) -> Channel {
    Channel(format!("{ACTION_TRIGGER_PREFIX}{table_id}"))
}

impl Channel {
    /// Returns the channel string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recovers the namespace and key tuple from a channel string.
    ///
    /// The cell collaborator key is split at the first `_` after the prefix.
    ///
    /// # Errors
    ///
    /// `InvalidChannel` for an unknown prefix or an empty key part.
    pub fn parse(s: &str) -> Result<ChannelKey, DomainError> {
        let key = if let Some(rest) = s.strip_prefix(CELL_COLLABORATOR_PREFIX) {
            let (table, view) = rest
                .split_once(SEPARATOR)
                .ok_or_else(|| invalid(s, "missing view id"))?;
            ChannelKey::CellCollaborator {
                table_id: TableId::new(non_empty(s, table)?),
                view_id: ViewId::new(non_empty(s, view)?),
            }
        } else if let Some(rest) = s.strip_prefix(COLLABORATOR_PREFIX) {
            ChannelKey::Collaborator {
                table_id: TableId::new(non_empty(s, rest)?),
            }
        } else if let Some(rest) = s.strip_prefix(NOTIFICATION_PREFIX) {
            ChannelKey::Notification {
                user_id: UserId::new(non_empty(s, rest)?),
            }
        } else if let Some(rest) = s.strip_prefix(ACTION_TRIGGER_PREFIX) {
            ChannelKey::ActionTrigger {
                table_id: TableId::new(non_empty(s, rest)?),
            }
        } else {
            return Err(invalid(s, "unknown channel prefix"));
        };
        Ok(key)
    }

    /// Namespace of this channel.
    pub fn namespace(&self) -> ChannelNamespace {
        // Every Channel value is built from a known prefix.
        if self.0.starts_with(CELL_COLLABORATOR_PREFIX) {
            ChannelNamespace::CellCollaborator
        } else if self.0.starts_with(COLLABORATOR_PREFIX) {
            ChannelNamespace::Collaborator
        } else if self.0.starts_with(NOTIFICATION_PREFIX) {
            ChannelNamespace::Notification
        } else {
            ChannelNamespace::ActionTrigger
        }
    }
}

impl ChannelKey {
    /// Channel name for this key tuple.
    pub fn channel(&self) -> Channel {
        match self {
            ChannelKey::Collaborator { table_id } => collaborator_channel(table_id),
            ChannelKey::CellCollaborator { table_id, view_id } => {
                cell_collaborator_channel(table_id, view_id)
            }
            ChannelKey::Notification { user_id } => notification_channel(user_id),
            ChannelKey::ActionTrigger { table_id } => action_trigger_channel(table_id),
        }
    }

    pub fn namespace(&self) -> ChannelNamespace {
        match self {
            ChannelKey::Collaborator { .. } => ChannelNamespace::Collaborator,
            ChannelKey::CellCollaborator { .. } => ChannelNamespace::CellCollaborator,
            ChannelKey::Notification { .. } => ChannelNamespace::Notification,
            ChannelKey::ActionTrigger { .. } => ChannelNamespace::ActionTrigger,
        }
    }
}

impl FromStr for Channel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::parse(s).map(|key| key.channel())
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Channel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn non_empty<'a>(channel: &str, part: &'a str) -> Result<&'a str, DomainError> {
    if part.is_empty() {
        Err(invalid(channel, "empty key part"))
    } else {
        Ok(part)
    }
}

fn invalid(channel: &str, reason: &str) -> DomainError {
    DomainError::new(
        ErrorCode::InvalidChannel,
        format!("Invalid channel '{}': {}", channel, reason),
    )
    .with_detail("channel", channel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn table(id: &str) -> TableId {
        TableId::new(id)
    }

    #[test]
    fn empty_id_names_a_channel_that_does_not_parse() {
        let channel = action_trigger_channel(&table(""));
        assert_eq!(channel.as_str(), "__action_trigger_");
        assert_eq!(
            Channel::parse(channel.as_str()).unwrap_err().code,
            ErrorCode::InvalidChannel
        );
    }

    #[test]
    fn collaborator_channel_matches_wire_format() {
        assert_eq!(collaborator_channel(&table("tblA")).as_str(), "__col_user_tblA");
    }

    #[test]
    fn cell_collaborator_channel_matches_wire_format() {
        let channel = cell_collaborator_channel(&table("tblA"), &ViewId::new("viwB"));
        assert_eq!(channel.as_str(), "__col_cell_user_tblA_viwB");
    }

    #[test]
    fn notification_channel_matches_wire_format() {
        let channel = notification_channel(&UserId::new("usrC"));
        assert_eq!(channel.as_str(), "__notification_user_usrC");
    }

    #[test]
    fn action_trigger_channel_matches_wire_format() {
        assert_eq!(
            action_trigger_channel(&table("tblA")).to_string(),
            "__action_trigger_tblA"
        );
    }

    #[test]
    fn namespace_is_reported_for_each_kind() {
        let t = table("tblA");
        assert_eq!(collaborator_channel(&t).namespace(), ChannelNamespace::Collaborator);
        assert_eq!(
            cell_collaborator_channel(&t, &ViewId::new("viwB")).namespace(),
            ChannelNamespace::CellCollaborator
        );
        assert_eq!(
            notification_channel(&UserId::new("usr")).namespace(),
            ChannelNamespace::Notification
        );
        assert_eq!(action_trigger_channel(&t).namespace(), ChannelNamespace::ActionTrigger);
    }

    #[test]
    fn parse_recovers_cell_collaborator_key() {
        let key = Channel::parse("__col_cell_user_tblA_viwB").unwrap();
        assert_eq!(
            key,
            ChannelKey::CellCollaborator {
                table_id: table("tblA"),
                view_id: ViewId::new("viwB"),
            }
        );
    }

    #[test]
    fn parse_rejects_unknown_prefix() {
        let err = Channel::parse("__presence_tblA").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidChannel);
    }

    #[test]
    fn parse_rejects_empty_parts() {
        assert!(Channel::parse("__col_user_").is_err());
        assert!(Channel::parse("__col_cell_user_tblA").is_err());
        assert!(Channel::parse("__col_cell_user__viwB").is_err());
        assert!(Channel::parse("__notification_user_").is_err());
    }

    #[test]
    fn from_str_normalizes_through_parse() {
        let channel: Channel = "__action_trigger_tblA".parse().unwrap();
        assert_eq!(channel, action_trigger_channel(&table("tblA")));
    }

    #[test]
    fn channel_serializes_as_plain_string() {
        let channel = collaborator_channel(&table("tblA"));
        assert_eq!(serde_json::to_string(&channel).unwrap(), r#""__col_user_tblA""#);
    }

    fn id() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9]{1,12}"
    }

    proptest! {
        #[test]
        fn table_channels_are_injective(a in id(), b in id()) {
            prop_assume!(a != b);
            let (ta, tb) = (table(&a), table(&b));
            prop_assert_ne!(collaborator_channel(&ta), collaborator_channel(&tb));
            prop_assert_ne!(action_trigger_channel(&ta), action_trigger_channel(&tb));
            prop_assert_ne!(
                notification_channel(&UserId::new(a.clone())),
                notification_channel(&UserId::new(b.clone()))
            );
        }

        #[test]
        fn cell_channels_are_injective(t1 in id(), v1 in id(), t2 in id(), v2 in id()) {
            prop_assume!((t1.as_str(), v1.as_str()) != (t2.as_str(), v2.as_str()));
            prop_assert_ne!(
                cell_collaborator_channel(&table(&t1), &ViewId::new(v1)),
                cell_collaborator_channel(&table(&t2), &ViewId::new(v2))
            );
        }

        #[test]
        fn naming_is_deterministic(t in id(), v in id()) {
            let (t, v) = (table(&t), ViewId::new(v));
            prop_assert_eq!(collaborator_channel(&t), collaborator_channel(&t));
            prop_assert_eq!(
                cell_collaborator_channel(&t, &v),
                cell_collaborator_channel(&t, &v)
            );
            prop_assert_eq!(action_trigger_channel(&t), action_trigger_channel(&t));
        }

        #[test]
        fn parse_inverts_naming(t in id(), v in id()) {
            let key = ChannelKey::CellCollaborator { table_id: table(&t), view_id: ViewId::new(v) };
            prop_assert_eq!(Channel::parse(key.channel().as_str()).unwrap(), key);

            let key = ChannelKey::ActionTrigger { table_id: table(&t) };
            prop_assert_eq!(Channel::parse(key.channel().as_str()).unwrap(), key);
        }
    }
}
