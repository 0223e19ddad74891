use crate::action::Action;
use crate::actor::Actor;
use serde::{Deserialize, Serialize};

/// Position-anchored annotations that ride alongside the action list.
///
/// `at` is the number of actions recorded before the marker, so a marker renders right before
/// `actions[at]` (or after the last action when `at == actions.len()`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Marker {
    /// Start of an alternative branch. `fragment` is the index of the enclosing `FragmentBegin`.
    Branch {
        at: usize,
        fragment: usize,
        label: String,
    },
    Note {
        at: usize,
        over: Vec<Actor>,
        text: String,
    },
}

impl Marker {
    pub fn at(&self) -> usize {
        match self {
            Self::Branch { at, .. } | Self::Note { at, .. } => *at,
        }
    }
}

/// The finished, ordered record of one diagram session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    actors: Vec<Actor>,
    actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    markers: Vec<Marker>,
}

impl Trace {
    pub(crate) fn new(actors: Vec<Actor>, actions: Vec<Action>, markers: Vec<Marker>) -> Self {
        Self {
            actors,
            actions,
            markers,
        }
    }

    /// Every actor declared by the session, in declaration order.
    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.actions.iter()
    }

    pub fn into_actions(self) -> Vec<Action> {
        self.actions
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

impl<'a> IntoIterator for &'a Trace {
    type Item = &'a Action;
    type IntoIter = std::slice::Iter<'a, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}

impl PartialEq<[Action]> for Trace {
    fn eq(&self, other: &[Action]) -> bool {
        self.actions.as_slice() == other
    }
}

impl PartialEq<Vec<Action>> for Trace {
    fn eq(&self, other: &Vec<Action>) -> bool {
        self.actions == *other
    }
}
