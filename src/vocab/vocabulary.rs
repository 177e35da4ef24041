//! Append-only token ⇄ id mapping with fixed padding (0) and unknown (1) ids.

use crate::config::VocabConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type TokenId = u32;

pub const PAD_ID: TokenId = 0;
pub const UNK_ID: TokenId = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    pad_token: String,
    unk_token: String,
    token_to_id: HashMap<String, TokenId>,
    id_to_token: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new("<pad>", "<unk>")
    }
}

impl Vocabulary {
    pub fn new(pad_token: impl Into<String>, unk_token: impl Into<String>) -> Self {
        let pad_token = pad_token.into();
        let unk_token = unk_token.into();
        let mut token_to_id = HashMap::new();
        token_to_id.insert(pad_token.clone(), PAD_ID);
        token_to_id.insert(unk_token.clone(), UNK_ID);
        Self {
            id_to_token: vec![pad_token.clone(), unk_token.clone()],
            pad_token,
            unk_token,
            token_to_id,
        }
    }

    pub fn from_config(config: &VocabConfig) -> Self {
        Self::new(config.pad_token.as_str(), config.unk_token.as_str())
    }

    /// Existing id, or the next free one (growth enabled)
    pub fn add(&mut self, token: &str) -> TokenId {
        if let Some(&id) = self.token_to_id.get(token) {
            return id;
        }
        let id = self.id_to_token.len() as TokenId;
        self.token_to_id.insert(token.to_string(), id);
        self.id_to_token.push(token.to_string());
        id
    }

    /// Existing id, or [`UNK_ID`]; never mutates
    pub fn lookup(&self, token: &str) -> TokenId {
        self.token_to_id.get(token).copied().unwrap_or(UNK_ID)
    }

    /// Absent tokens always map to [`UNK_ID`] and never grow the vocabulary.
    pub fn assign_or_lookup(&mut self, token: Option<&str>, grow: bool) -> TokenId {
        match token {
            None => UNK_ID,
            Some(t) if grow => self.add(t),
            Some(t) => self.lookup(t),
        }
    }

    pub fn encode<I, S>(&mut self, tokens: I, grow: bool) -> Vec<TokenId>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tokens
            .into_iter()
            .map(|t| self.assign_or_lookup(Some(t.as_ref()), grow))
            .collect()
    }

    pub fn encode_optional<'a, I>(&mut self, tokens: I, grow: bool) -> Vec<TokenId>
    where
        I: IntoIterator<Item = &'a Option<String>>,
    {
        tokens
            .into_iter()
            .map(|t| self.assign_or_lookup(t.as_deref(), grow))
            .collect()
    }

    pub fn token(&self, id: TokenId) -> Option<&str> {
        self.id_to_token.get(id as usize).map(String::as_str)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.token_to_id.contains_key(token)
    }

    /// Known tokens, reserved ones included
    pub fn len(&self) -> usize {
        self.id_to_token.len()
    }

    /// True while only the reserved tokens are known
    pub fn is_empty(&self) -> bool {
        self.id_to_token.len() <= 2
    }

    pub fn pad_token(&self) -> &str {
        &self.pad_token
    }

    pub fn unk_token(&self) -> &str {
        &self.unk_token
    }
}
