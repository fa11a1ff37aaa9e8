//! Bidirectional identifier to token maps.
//!
//! Tokens are dense integers used for O(1) comparisons and compact storage
//! in the batch buffers. A table runs in one of two modes: fixed tables are
//! sealed at construction and reject unknown identifiers, lazy tables assign
//! the next sequential token on first sight.

use crate::types::schema::{ElementIdentifier, NodeLabel, RelationshipType, SchemaError, SchemaResult};
use parking_lot::RwLock;
use std::collections::HashMap;

pub type LabelToken = i32;

/// Token reserved for the `*` identifier matching every element.
pub const ANY_LABEL_TOKEN: LabelToken = -1;

struct TableState<T> {
    tokens: HashMap<T, LabelToken>,
    identifiers_by_token: HashMap<LabelToken, Vec<T>>,
    next_token: LabelToken,
}

/// Thread-safe identifier to token map.
///
/// Reads go through an uncontended read lock; lazy creation takes the write
/// lock once per new identifier. Tokens are never reused.
pub struct TokenTable<T: ElementIdentifier> {
    state: RwLock<TableState<T>>,
    fixed: bool,
    any_identifier: Option<T>,
}

pub type TokenToNodeLabels = TokenTable<NodeLabel>;
pub type TokenToRelationshipTypes = TokenTable<RelationshipType>;

impl<T: ElementIdentifier> TokenTable<T> {
    fn empty(any_identifier: Option<T>) -> Self {
        let mut state = TableState {
            tokens: HashMap::new(),
            identifiers_by_token: HashMap::new(),
            next_token: 0,
        };
        if let Some(any) = &any_identifier {
            state.tokens.insert(any.clone(), ANY_LABEL_TOKEN);
            state
                .identifiers_by_token
                .insert(ANY_LABEL_TOKEN, vec![any.clone()]);
        }
        Self {
            state: RwLock::new(state),
            fixed: false,
            any_identifier,
        }
    }

    fn register(&self, identifier: T) -> LabelToken {
        let mut state = self.state.write();
        if let Some(&token) = state.tokens.get(&identifier) {
            return token;
        }
        let token = state.next_token;
        state.next_token += 1;
        state.tokens.insert(identifier.clone(), token);
        state
            .identifiers_by_token
            .entry(token)
            .or_default()
            .push(identifier);
        token
    }

    /// Resolves the token for `identifier`.
    ///
    /// Fixed tables fail for identifiers that were not pre-registered; lazy
    /// tables atomically assign the next sequential token.
    pub fn token_of(&self, identifier: &T) -> SchemaResult<LabelToken> {
        {
            let state = self.state.read();
            if let Some(&token) = state.tokens.get(identifier) {
                return Ok(token);
            }
        }
        if self.fixed {
            return Err(SchemaError::UnknownLabel {
                label: identifier.name().to_string(),
            });
        }
        Ok(self.register(identifier.clone()))
    }

    /// Identifiers a token resolves to. The `*` token may fan out to several
    /// identifiers for filtering.
    pub fn identifiers_of(&self, token: LabelToken) -> Vec<T> {
        self.state
            .read()
            .identifiers_by_token
            .get(&token)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of assigned tokens, excluding the `*` sentinel.
    pub fn token_count(&self) -> usize {
        self.state.read().next_token as usize
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    pub fn any_identifier(&self) -> Option<&T> {
        self.any_identifier.as_ref()
    }
}

impl TokenToNodeLabels {
    /// A sealed table over a known label set. The `*` label resolves to the
    /// reserved [`ANY_LABEL_TOKEN`].
    pub fn fixed(labels: impl IntoIterator<Item = NodeLabel>) -> Self {
        let table = Self::empty(Some(NodeLabel::all_nodes()));
        for label in labels {
            if !label.is_all_nodes() {
                table.register(label);
            }
        }
        // Seal after pre-registration.
        Self {
            fixed: true,
            ..table
        }
    }

    /// On-demand table that discovers labels from the data.
    pub fn lazy() -> Self {
        Self::empty(Some(NodeLabel::all_nodes()))
    }
}

impl TokenToRelationshipTypes {
    pub fn fixed(types: impl IntoIterator<Item = RelationshipType>) -> Self {
        let table = Self::empty(None);
        for relationship_type in types {
            table.register(relationship_type);
        }
        Self {
            fixed: true,
            ..table
        }
    }

    pub fn lazy() -> Self {
        Self::empty(None)
    }
}
