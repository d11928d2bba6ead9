//! RDF loading and content extraction.
//!
//! Files are parsed into an [`RdfGraph`] with [`load_graph`] (or the explicit
//! two-step [`attempt_parse`]), then mined per [`Category`] with [`extract`].

mod error;
pub mod extract;
mod graph;

pub use error::RdfError;
pub use extract::{Category, ContentBundle, DEFAULT_MAX_ITEMS, Extraction, extract};
pub use graph::{FALLBACK_FORMAT, ParseAttempt, RdfGraph, attempt_parse, guess_format, load_graph};
pub use oxrdfio::RdfFormat;
