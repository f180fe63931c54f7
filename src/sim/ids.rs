//! Entity identifiers
//!
//! Labels are the only identity shared between the two clients. The wire
//! form keeps the `nail_` / `chain_` / `custom_` prefixes, but inside the
//! crate an id is a tagged value so dispatch never depends on string prefixes.

use std::fmt;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// What an entity id refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    /// A pin (nail) body
    Pin,
    /// A player-created chain constraint
    Chain,
    /// A freehand drawn body
    Shape,
    /// Level geometry (walls, floor, ball, goal, platforms)
    Scenery,
}

impl EntityKind {
    /// Wire prefix for player-created kinds
    pub fn prefix(&self) -> Option<&'static str> {
        match self {
            EntityKind::Pin => Some("nail"),
            EntityKind::Chain => Some("chain"),
            EntityKind::Shape => Some("custom"),
            EntityKind::Scenery => None,
        }
    }
}

/// Typed entity identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct EntityId {
    pub kind: EntityKind,
    pub key: String,
}

impl EntityId {
    pub fn new(kind: EntityKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
        }
    }

    /// Level geometry id (bare name on the wire)
    pub fn scenery(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Scenery, name)
    }

    /// Parse a wire label
    pub fn parse(label: &str) -> Self {
        for kind in [EntityKind::Pin, EntityKind::Chain, EntityKind::Shape] {
            if let Some(prefix) = kind.prefix() {
                if let Some(rest) = label.strip_prefix(prefix) {
                    if let Some(key) = rest.strip_prefix('_') {
                        return Self::new(kind, key);
                    }
                }
            }
        }
        Self::scenery(label)
    }

    pub fn is_pin(&self) -> bool {
        self.kind == EntityKind::Pin
    }

    pub fn is_chain(&self) -> bool {
        self.kind == EntityKind::Chain
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind.prefix() {
            Some(prefix) => write!(f, "{}_{}", prefix, self.key),
            None => f.write_str(&self.key),
        }
    }
}

impl From<String> for EntityId {
    fn from(label: String) -> Self {
        Self::parse(&label)
    }
}

impl From<&str> for EntityId {
    fn from(label: &str) -> Self {
        Self::parse(label)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.to_string()
    }
}

/// Generates ids for locally authored entities.
///
/// Keys are `<session tag>-<counter>`. The tag is drawn once per client so
/// the two peers never produce the same key, and the counter keeps rapid
/// creations on one client distinct.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    session: u32,
    next: u64,
}

impl IdGenerator {
    /// Create a generator whose session tag comes from `seed`
    pub fn new(seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        Self {
            session: rng.random(),
            next: 1,
        }
    }

    pub fn session_tag(&self) -> u32 {
        self.session
    }

    /// Allocate the next id of the given kind
    pub fn next_id(&mut self, kind: EntityKind) -> EntityId {
        let key = format!("{:08x}-{}", self.session, self.next);
        self.next += 1;
        EntityId::new(kind, key)
    }
}
