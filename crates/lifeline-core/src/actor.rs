use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Random per-session tag; keeps actors of two diagrams from comparing equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self(Uuid::nil())
    }
}

/// A participant (lifeline) of the diagram.
///
/// Actors are compared by identity: two actors are equal when they were declared by the same
/// session at the same index. Name and type label do not participate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    #[serde(skip)]
    session: SessionId,
    id: u32,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    class: Option<String>,
}

impl Actor {
    pub(crate) fn new(session: SessionId, id: u32, name: String, class: Option<String>) -> Self {
        Self {
            session,
            id,
            name,
            class,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    /// `name:Class`, or just `name` for untyped actors.
    pub fn label(&self) -> String {
        match &self.class {
            Some(class) => format!("{}:{}", self.name, class),
            None => self.name.clone(),
        }
    }
}

impl PartialEq for Actor {
    fn eq(&self, other: &Self) -> bool {
        self.session == other.session && self.id == other.id
    }
}

impl Eq for Actor {}

impl Hash for Actor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.session.hash(state);
        self.id.hash(state);
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
