//! Token vocabularies for actions and products.

mod shared;
mod vocabulary;

pub use shared::SharedVocabulary;
pub use vocabulary::{TokenId, Vocabulary, PAD_ID, UNK_ID};
