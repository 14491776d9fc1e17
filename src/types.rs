//! Core data types: nodes, hyperedges, ids, and provenance.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Typed id wrappers ──────────────────────────────────────────────

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

typed_id!(NodeId);
typed_id!(EdgeId);

// ── Node ─────────────────────────────────────────────────────────────

/// An entity in the hypergraph. The id is the canonical normalized form of `label`
/// (see [`crate::normalize::normalize_id`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, serde_json::Value>,
    /// Dense embedding used only by the deduplication pass, never by discovery operators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Ids of edges this node currently participates in, maintained by the store.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub incident_edges: Vec<EdgeId>,
}

impl Node {
    pub fn new(id: NodeId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            properties: HashMap::new(),
            embedding: None,
            incident_edges: Vec::new(),
        }
    }

    /// `degree(n) == |incident_edges(n)|`, maintained as an invariant by the store.
    pub fn degree(&self) -> usize {
        self.incident_edges.len()
    }
}

// ── Provenance ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Provenance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_document: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_chunk_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_page: Option<i64>,
}

impl Provenance {
    fn is_empty(&self) -> bool {
        self.source_document.is_none()
            && self.source_chunk_id.is_none()
            && self.source_page.is_none()
    }
}

// ── HyperEdge ────────────────────────────────────────────────────────

/// A directed relation instance connecting an ordered set of source nodes to an
/// ordered set of target nodes through a named relation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HyperEdge {
    pub id: EdgeId,
    pub sources: Vec<NodeId>,
    /// Free-form relation name; canonicalized lowercase for indexing.
    pub relation: String,
    pub targets: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Provenance::is_empty")]
    pub provenance: Provenance,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
}

fn default_confidence() -> f64 {
    1.0
}

impl HyperEdge {
    /// `|sources| + |targets|`.
    pub fn size(&self) -> usize {
        self.sources.len() + self.targets.len()
    }

    /// All distinct node ids participating in this edge (sources ∪ targets).
    pub fn all_nodes(&self) -> std::collections::BTreeSet<NodeId> {
        self.sources
            .iter()
            .chain(self.targets.iter())
            .cloned()
            .collect()
    }

    pub fn relation_lower(&self) -> String {
        self.relation.to_lowercase()
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.sources.contains(id) || self.targets.contains(id)
    }

    /// Node ids shared between `self` and `other`.
    pub fn intersection(&self, other: &HyperEdge) -> std::collections::BTreeSet<NodeId> {
        let mine = self.all_nodes();
        let theirs = other.all_nodes();
        mine.intersection(&theirs).cloned().collect()
    }

    /// An edge is a self-loop iff `set(sources) == set(targets)`.
    pub fn is_self_loop(&self) -> bool {
        let s: std::collections::BTreeSet<&NodeId> = self.sources.iter().collect();
        let t: std::collections::BTreeSet<&NodeId> = self.targets.iter().collect();
        !s.is_empty() && s == t
    }

    /// Key used to detect duplicate edges: relation + sorted source/target multisets.
    pub fn dedup_key(&self) -> (String, Vec<NodeId>, Vec<NodeId>) {
        let mut sources = self.sources.clone();
        let mut targets = self.targets.clone();
        sources.sort();
        targets.sort();
        (self.relation_lower(), sources, targets)
    }
}
