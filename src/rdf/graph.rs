//! Loading downloaded files into in-memory graphs.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use oxrdf::{Graph, NamedNode, Triple, TripleRef};
use oxrdfio::{RdfFormat, RdfParseError, RdfParser};
use tracing::debug;

use super::error::RdfError;

/// Format tried when the extension does not reveal one.
pub const FALLBACK_FORMAT: RdfFormat = RdfFormat::RdfXml;

/// A parsed file. Named graphs are flattened; duplicate triples collapse.
#[derive(Debug, Default)]
pub struct RdfGraph {
    graph: Graph,
}

impl RdfGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a triple to the graph.
    pub fn insert(&mut self, triple: &Triple) {
        self.graph.insert(triple);
    }

    /// Returns the number of distinct triples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    /// Returns true if the graph contains no triples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Returns an iterator over the triples.
    pub fn iter(&self) -> impl Iterator<Item = TripleRef<'_>> {
        self.graph.iter()
    }
}

impl FromIterator<Triple> for RdfGraph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        let mut graph = Self::new();
        for triple in iter {
            graph.insert(&triple);
        }
        graph
    }
}

/// Result of one parse attempt.
#[derive(Debug)]
pub enum ParseAttempt {
    /// The file was parsed with the given format.
    Parsed {
        /// The parsed content.
        graph: RdfGraph,
        /// Format that worked.
        format: RdfFormat,
    },
    /// No format could be inferred; retry with an explicit one.
    NeedsFormatHint,
    /// The parser rejected the file.
    Failed(RdfError),
}

/// Infers the serialization from the file extension.
#[must_use]
pub fn guess_format(path: &Path) -> Option<RdfFormat> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "rdfs" | "owl" | "xml" => Some(RdfFormat::RdfXml),
        "turtle" => Some(RdfFormat::Turtle),
        "ntriples" => Some(RdfFormat::NTriples),
        "nquads" => Some(RdfFormat::NQuads),
        "json" => RdfFormat::from_extension("jsonld"),
        other => RdfFormat::from_extension(other),
    }
}

/// Parses `path` with `format`, or with the format guessed from its extension.
#[must_use]
pub fn attempt_parse(path: &Path, format: Option<RdfFormat>) -> ParseAttempt {
    let Some(format) = format.or_else(|| guess_format(path)) else {
        return ParseAttempt::NeedsFormatHint;
    };
    match parse_file(path, format) {
        Ok(graph) => ParseAttempt::Parsed { graph, format },
        Err(error) => ParseAttempt::Failed(error),
    }
}

/// Loads a file: extension-guessed format first, then [`FALLBACK_FORMAT`].
///
/// # Errors
///
/// Returns the parser's error when the file cannot be read or parsed.
pub fn load_graph(path: &Path) -> Result<(RdfGraph, RdfFormat), RdfError> {
    match attempt_parse(path, None) {
        ParseAttempt::Parsed { graph, format } => Ok((graph, format)),
        ParseAttempt::Failed(error) => Err(error),
        ParseAttempt::NeedsFormatHint => {
            debug!(path = %path.display(), "could not guess RDF format, trying RDF/XML");
            let graph = parse_file(path, FALLBACK_FORMAT)?;
            Ok((graph, FALLBACK_FORMAT))
        }
    }
}

fn parse_file(path: &Path, format: RdfFormat) -> Result<RdfGraph, RdfError> {
    let file = File::open(path).map_err(|e| RdfError::io(path, e))?;

    let mut parser = RdfParser::from_format(format);
    if let Some(base) = base_iri(path) {
        parser = parser
            .with_base_iri(base)
            .map_err(|e| RdfError::syntax(path, format!("invalid base IRI: {e}")))?;
    }

    let mut graph = RdfGraph::new();
    for quad in parser.for_reader(BufReader::new(file)) {
        let quad = quad.map_err(|e| match e {
            RdfParseError::Io(source) => RdfError::io(path, source),
            RdfParseError::Syntax(syntax) => RdfError::syntax(path, syntax.to_string()),
        })?;
        graph.insert(&Triple::new(quad.subject, quad.predicate, quad.object));
    }
    Ok(graph)
}

/// `file://` IRI of the file, used to resolve relative references.
fn base_iri(path: &Path) -> Option<String> {
    let absolute = std::path::absolute(path).ok()?;
    let candidate = format!("file://{}", absolute.to_str()?);
    NamedNode::new(candidate.as_str()).ok()?;
    Some(candidate)
}
