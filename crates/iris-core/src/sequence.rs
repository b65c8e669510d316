//! Sequence diagram model: participants, ordered messages and activation bars.

use serde::{Deserialize, Serialize};

use crate::kind::kind_enum;
use crate::sanitize::sanitize_text;

kind_enum! {
    ParticipantKind {
        Actor => "actor",
        Component => "component",
        Service => "service",
    }
}

kind_enum! {
    MessageKind {
        Sync => "sync",
        Async => "async",
        Reply => "reply",
    }
}

/// A lifeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParticipantKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
}

impl Participant {
    pub fn new(id: impl Into<String>, name: &str, kind: ParticipantKind) -> Self {
        Self {
            id: id.into(),
            name: sanitize_text(name),
            kind,
            entity_id: None,
        }
    }

    pub fn linked_to(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SequenceMessage {
    pub id: String,
    pub from: String,
    pub to: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Position in the diagram. Consumers sort by it; storage order is
    /// irrelevant.
    pub order: i64,
}

impl SequenceMessage {
    pub fn new(
        id: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        label: &str,
        kind: MessageKind,
        order: i64,
    ) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            label: sanitize_text(label),
            kind,
            order,
        }
    }
}

/// Activation bar on a lifeline, spanning messages `start_order..=end_order`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Activation {
    pub participant_id: String,
    pub start_order: i64,
    pub end_order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SequenceDiagramData {
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub messages: Vec<SequenceMessage>,
    #[serde(default)]
    pub activations: Vec<Activation>,
}

impl SequenceDiagramData {
    /// Messages in diagram order. Ties keep their stored order.
    pub fn sorted_messages(&self) -> Vec<&SequenceMessage> {
        let mut sorted: Vec<_> = self.messages.iter().collect();
        sorted.sort_by_key(|m| m.order);
        sorted
    }

    pub fn activations_for<'a>(
        &'a self,
        participant_id: &'a str,
    ) -> impl Iterator<Item = &'a Activation> + 'a {
        self.activations
            .iter()
            .filter(move |a| a.participant_id == participant_id)
    }

    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// Order value to give a message appended at the end. Saturates at
    /// `i64::MAX`.
    pub fn next_message_order(&self) -> i64 {
        self.messages
            .iter()
            .map(|m| m.order.saturating_add(1))
            .max()
            .unwrap_or(0)
    }

    /// Participant ids referenced by messages or activations that no
    /// participant declares. Each id is listed once, in first-seen order.
    pub fn dangling_references(&self) -> Vec<&str> {
        let referenced = self
            .messages
            .iter()
            .flat_map(|m| [m.from.as_str(), m.to.as_str()])
            .chain(self.activations.iter().map(|a| a.participant_id.as_str()));

        let mut dangling: Vec<&str> = Vec::new();
        for id in referenced {
            if self.participant(id).is_none() && !dangling.contains(&id) {
                dangling.push(id);
            }
        }
        dangling
    }
}
