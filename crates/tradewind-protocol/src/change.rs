//! Change sets: what a server-side handler wants sent, and to whom.

use crate::catalogue::ErrorMessage;
use crate::{Message, PlayerId};

/// Who should receive one change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    All,
    Player(PlayerId),
    AllExcept(PlayerId),
}

impl Recipient {
    pub fn includes(&self, player: &PlayerId) -> bool {
        match self {
            Recipient::All => true,
            Recipient::Player(p) => p == player,
            Recipient::AllExcept(p) => p != player,
        }
    }
}

/// Ordered game-state changes resulting from handling one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<(Recipient, Message)>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A change set holding only a complaint to `player`.
    pub fn complaint(player: &PlayerId, text: impl Into<String>) -> Self {
        Self::new().with(
            Recipient::Player(player.clone()),
            ErrorMessage::new(text),
        )
    }

    pub fn with(mut self, recipient: Recipient, message: impl Into<Message>) -> Self {
        self.push(recipient, message);
        self
    }

    pub fn push(&mut self, recipient: Recipient, message: impl Into<Message>) {
        self.changes.push((recipient, message.into()));
    }

    /// Appends all changes of `other`, keeping order.
    pub fn extend(&mut self, other: ChangeSet) {
        self.changes.extend(other.changes);
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Recipient, Message)> {
        self.changes.iter()
    }

    /// The messages `player` should see, in order.
    pub fn messages_for(&self, player: &PlayerId) -> Vec<Message> {
        self.changes
            .iter()
            .filter(|(recipient, _)| recipient.includes(player))
            .map(|(_, message)| message.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::{EndTurn, Emigrate};

    #[test]
    fn test_recipient_includes() {
        let one = PlayerId::new("player:1");
        let two = PlayerId::new("player:2");
        assert!(Recipient::All.includes(&one));
        assert!(Recipient::Player(one.clone()).includes(&one));
        assert!(!Recipient::Player(one.clone()).includes(&two));
        assert!(!Recipient::AllExcept(one.clone()).includes(&one));
        assert!(Recipient::AllExcept(one).includes(&two));
    }

    #[test]
    fn test_messages_for_keeps_order_and_filters() {
        let one = PlayerId::new("player:1");
        let two = PlayerId::new("player:2");
        let changes = ChangeSet::new()
            .with(Recipient::Player(one.clone()), Emigrate { slot: 1 })
            .with(Recipient::All, EndTurn)
            .with(Recipient::AllExcept(one.clone()), Emigrate { slot: 2 });

        assert_eq!(
            changes.messages_for(&one),
            vec![Message::from(Emigrate { slot: 1 }), EndTurn.into()]
        );
        assert_eq!(
            changes.messages_for(&two),
            vec![Message::from(EndTurn), Emigrate { slot: 2 }.into()]
        );
    }

    #[test]
    fn test_complaint_targets_only_requester() {
        let one = PlayerId::new("player:1");
        let changes = ChangeSet::complaint(&one, "no");
        assert_eq!(changes.len(), 1);
        assert!(changes.messages_for(&PlayerId::new("player:2")).is_empty());
        assert!(matches!(changes.messages_for(&one)[0], Message::Error(_)));
    }
}
