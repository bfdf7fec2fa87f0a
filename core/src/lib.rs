//! Query engine for pre-built documentation search indexes.
//!
//! An index snapshot (documents plus body, title and object postings) is
//! loaded once, validated, and then answers free-text queries with ranked
//! results:
//!
//! ```no_run
//! use docsearch_core::{persist, Engine, SearchConfig};
//!
//! # fn main() -> docsearch_core::Result<()> {
//! let engine = Engine::new(SearchConfig::sphinx())?;
//! engine.load_index(persist::open_index("_build/html/searchindex.js")?)?;
//! for hit in engine.search("poultry feed")? {
//!     println!("{:>6.1}  {}", hit.score, hit.document.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod persist;
pub mod raw;
pub mod resolver;
pub mod scorer;
pub mod searchindex;
pub mod tokenizer;

pub use config::{SearchConfig, Weights};
pub use engine::{Engine, SearchResult};
pub use error::{Error, Result};
pub use index::{DocId, Document, ObjectEntry, Posting, Snapshot};
pub use raw::RawIndex;
pub use tokenizer::{QueryTerm, Tokenizer, TokenizerConfig};
