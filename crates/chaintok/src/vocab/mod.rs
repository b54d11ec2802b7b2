//! # Vocabulary

pub mod added_vocab;
pub mod byte_table;
pub mod merge_ranks;
pub mod token_vocab;

pub use added_vocab::{AddedToken, AddedVocabulary, Segment};
pub use byte_table::ByteTable;
pub use merge_ranks::MergeRanks;
pub use token_vocab::TokenVocab;
