#![forbid(unsafe_code)]

//! Token-indexed storage for observer records.
//!
//! A [`Registry`] hands out a fresh [`Token`] for every inserted value and
//! lets the holder of that token remove the value later. Tokens come from a
//! per-registry monotonic counter, so a token is never reused while the
//! registry lives. Iteration follows token order, which keeps propagation
//! deterministic for records of equal height.

use std::collections::BTreeMap;

/// Handle to a value stored in a [`Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(u64);

impl Token {
    /// Get the raw token value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Token-indexed mapping with monotonic key assignment.
#[derive(Debug, Clone)]
pub struct Registry<A> {
    items: BTreeMap<Token, A>,
    next_token: u64,
}

impl<A> Registry<A> {
    /// Create an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: BTreeMap::new(),
            next_token: 0,
        }
    }

    /// Store `value` and return its token.
    pub fn add(&mut self, value: A) -> Token {
        let token = Token(self.next_token);
        self.next_token += 1;
        self.items.insert(token, value);
        token
    }

    /// Remove the value stored under `token`, if any.
    pub fn remove(&mut self, token: Token) -> Option<A> {
        self.items.remove(&token)
    }

    /// Look up the value stored under `token`.
    #[must_use]
    pub fn get(&self, token: Token) -> Option<&A> {
        self.items.get(&token)
    }

    /// Whether `token` is currently registered.
    #[must_use]
    pub fn contains(&self, token: Token) -> bool {
        self.items.contains_key(&token)
    }

    /// Iterate over the stored values.
    pub fn values(&self) -> impl Iterator<Item = &A> {
        self.items.values()
    }

    /// Iterate over the live tokens.
    pub fn keys(&self) -> impl Iterator<Item = Token> + '_ {
        self.items.keys().copied()
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove every value. Tokens issued afterwards stay fresh.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<A> Default for Registry<A> {
    fn default() -> Self {
        Self::new()
    }
}
