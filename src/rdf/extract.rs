//! Content extraction from parsed graphs.
//!
//! Each category walks the whole graph once. Every match is counted, but only
//! the first `max_items` are kept, so the counts stay exact for statistics
//! while the lists stay bounded.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use oxrdf::vocab::{rdf, rdfs, xsd};
use oxrdf::{LiteralRef, NamedNodeRef, NamedOrBlankNodeRef, TermRef};
use serde::{Deserialize, Serialize};

use super::graph::RdfGraph;

/// `owl:Class`, which oxrdf does not ship a constant for.
pub const OWL_CLASS: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#Class");

/// Default cap on extracted items per category and file.
pub const DEFAULT_MAX_ITEMS: usize = 100_000;

/// Seconds are printed whole, or with microseconds when a fraction is present.
const WHOLE_SECONDS: &str = "%S";
const MICRO_SECONDS: &str = "%S%.6f";

const INTEGER_TYPES: &[NamedNodeRef<'static>] = &[
    xsd::INTEGER,
    xsd::INT,
    xsd::LONG,
    xsd::SHORT,
    xsd::BYTE,
    xsd::NON_NEGATIVE_INTEGER,
    xsd::NON_POSITIVE_INTEGER,
    xsd::POSITIVE_INTEGER,
    xsd::NEGATIVE_INTEGER,
    xsd::UNSIGNED_INT,
    xsd::UNSIGNED_LONG,
    xsd::UNSIGNED_SHORT,
    xsd::UNSIGNED_BYTE,
];

/// One of the four extraction targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Classes,
    Properties,
    Entities,
    Literals,
}

impl Category {
    /// All categories, in output order.
    pub const ALL: [Self; 4] = [
        Self::Classes,
        Self::Properties,
        Self::Entities,
        Self::Literals,
    ];

    /// Key used in content files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Classes => "classes",
            Self::Properties => "properties",
            Self::Entities => "entities",
            Self::Literals => "literals",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "classes" => Ok(Self::Classes),
            "properties" => Ok(Self::Properties),
            "entities" => Ok(Self::Entities),
            "literals" => Ok(Self::Literals),
            _ => Err(format!(
                "invalid category: {s} (expected classes, properties, entities or literals)"
            )),
        }
    }
}

/// Items kept for one category plus the total number of matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub items: Vec<String>,
    pub count: usize,
}

impl Extraction {
    fn push(&mut self, item: impl FnOnce() -> String, max_items: usize) {
        if self.count < max_items {
            self.items.push(item());
        }
        self.count += 1;
    }
}

/// Content of a file or a whole dataset, keyed by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBundle {
    pub classes: Vec<String>,
    pub properties: Vec<String>,
    pub entities: Vec<String>,
    pub literals: Vec<String>,
}

impl ContentBundle {
    /// Items of one category.
    #[must_use]
    pub fn get(&self, category: Category) -> &[String] {
        match category {
            Category::Classes => &self.classes,
            Category::Properties => &self.properties,
            Category::Entities => &self.entities,
            Category::Literals => &self.literals,
        }
    }

    fn get_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::Classes => &mut self.classes,
            Category::Properties => &mut self.properties,
            Category::Entities => &mut self.entities,
            Category::Literals => &mut self.literals,
        }
    }

    /// Replaces the items of one category.
    pub fn set(&mut self, category: Category, items: Vec<String>) {
        *self.get_mut(category) = items;
    }

    /// Appends another bundle category by category.
    pub fn extend_from(&mut self, other: &Self) {
        for category in Category::ALL {
            self.get_mut(category)
                .extend(other.get(category).iter().cloned());
        }
    }

    /// True when all four categories are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        Category::ALL
            .iter()
            .all(|category| self.get(*category).is_empty())
    }
}

/// Extracts one category from `graph`, keeping at most `max_items` items.
#[must_use]
pub fn extract(graph: &RdfGraph, category: Category, max_items: usize) -> Extraction {
    match category {
        Category::Classes => extract_classes(graph, max_items),
        Category::Properties => extract_properties(graph, max_items),
        Category::Entities => extract_entities(graph, max_items),
        Category::Literals => extract_literals(graph, max_items),
    }
}

fn extract_classes(graph: &RdfGraph, max_items: usize) -> Extraction {
    let mut extraction = Extraction::default();

    for class_node in [rdfs::CLASS, OWL_CLASS] {
        for triple in graph.iter() {
            if triple.predicate != rdf::TYPE || triple.object != TermRef::NamedNode(class_node) {
                continue;
            }
            if let NamedOrBlankNodeRef::NamedNode(subject) = triple.subject {
                extraction.push(|| subject.as_str().to_string(), max_items);
            }
        }
    }

    for triple in graph.iter().filter(|t| t.predicate == rdf::TYPE) {
        match triple.object {
            TermRef::NamedNode(node) => extraction.push(|| node.as_str().to_string(), max_items),
            TermRef::Literal(literal) => {
                extraction.push(|| literal.value().to_string(), max_items);
            }
            _ => {}
        }
    }

    extraction
}

fn extract_properties(graph: &RdfGraph, max_items: usize) -> Extraction {
    let mut extraction = Extraction::default();
    for triple in graph.iter() {
        extraction.push(|| triple.predicate.as_str().to_string(), max_items);
    }
    extraction
}

fn extract_entities(graph: &RdfGraph, max_items: usize) -> Extraction {
    let mut extraction = Extraction::default();
    for triple in graph.iter() {
        if let NamedOrBlankNodeRef::NamedNode(subject) = triple.subject {
            extraction.push(|| subject.as_str().to_string(), max_items);
        }
        if let TermRef::NamedNode(object) = triple.object {
            extraction.push(|| object.as_str().to_string(), max_items);
        }
    }
    extraction
}

fn extract_literals(graph: &RdfGraph, max_items: usize) -> Extraction {
    let mut extraction = Extraction::default();
    for triple in graph.iter() {
        let TermRef::Literal(literal) = triple.object else {
            continue;
        };
        // ill-typed date/time values are dropped, not counted
        let Ok(value) = literal_to_string(literal) else {
            continue;
        };
        extraction.push(|| value, max_items);
    }
    extraction
}

/// Converts a literal to its native value and renders it as a string.
///
/// Date, time and date-time values must be well formed; integers and booleans
/// are canonicalised when they parse and kept verbatim otherwise.
///
/// # Errors
///
/// Returns the chrono error for malformed `xsd:dateTime`, `xsd:date` or
/// `xsd:time` values.
pub fn literal_to_string(literal: LiteralRef<'_>) -> Result<String, chrono::ParseError> {
    let value = literal.value();
    let datatype = literal.datatype();
    let trimmed = value.trim();

    if datatype == xsd::DATE_TIME {
        if let Ok(with_offset) = DateTime::parse_from_rfc3339(trimmed) {
            let pattern = format!("%Y-%m-%d %H:%M:{}%:z", seconds_pattern(&with_offset));
            return Ok(with_offset.format(&pattern).to_string());
        }
        let naive = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")?;
        let pattern = format!("%Y-%m-%d %H:%M:{}", seconds_pattern(&naive));
        return Ok(naive.format(&pattern).to_string());
    }
    if datatype == xsd::DATE {
        let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")?;
        return Ok(date.format("%Y-%m-%d").to_string());
    }
    if datatype == xsd::TIME {
        let time = NaiveTime::parse_from_str(trimmed, "%H:%M:%S%.f")?;
        let pattern = format!("%H:%M:{}", seconds_pattern(&time));
        return Ok(time.format(&pattern).to_string());
    }
    if INTEGER_TYPES.iter().any(|integer| *integer == datatype) {
        return Ok(trimmed
            .parse::<i128>()
            .map_or_else(|_| value.to_string(), |n| n.to_string()));
    }
    if datatype == xsd::BOOLEAN {
        return Ok(match trimmed {
            "true" | "1" => "true".to_string(),
            "false" | "0" => "false".to_string(),
            _ => value.to_string(),
        });
    }
    Ok(value.to_string())
}

fn seconds_pattern(value: &impl Timelike) -> &'static str {
    if value.nanosecond() == 0 {
        WHOLE_SECONDS
    } else {
        MICRO_SECONDS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{BlankNode, Literal, NamedNode, Triple};

    fn node(iri: &str) -> NamedNode {
        NamedNode::new_unchecked(iri)
    }

    fn graph_of(triples: Vec<Triple>) -> RdfGraph {
        triples.into_iter().collect()
    }

    #[test]
    fn test_classes_include_declared_and_used_classes() {
        let graph = graph_of(vec![
            Triple::new(node("http://ex.org/A"), rdf::TYPE, rdfs::CLASS.into_owned()),
            Triple::new(node("http://ex.org/B"), rdf::TYPE, OWL_CLASS.into_owned()),
            Triple::new(node("http://ex.org/x"), rdf::TYPE, node("http://ex.org/A")),
            Triple::new(BlankNode::default(), rdf::TYPE, rdfs::CLASS.into_owned()),
        ]);

        let extraction = extract(&graph, Category::Classes, 100);

        assert!(extraction.items.contains(&"http://ex.org/A".to_string()));
        assert!(extraction.items.contains(&"http://ex.org/B".to_string()));
        assert!(
            extraction
                .items
                .contains(&rdfs::CLASS.as_str().to_string())
        );
        assert!(extraction.items.iter().all(|item| !item.starts_with("_:")));
        // A, B (declared) + rdfs:Class, owl:Class, A, rdfs:Class (objects of rdf:type)
        assert_eq!(extraction.count, 6);
    }

    #[test]
    fn test_classes_skip_blank_objects() {
        let graph = graph_of(vec![Triple::new(
            node("http://ex.org/x"),
            rdf::TYPE,
            BlankNode::default(),
        )]);
        assert_eq!(extract(&graph, Category::Classes, 10).count, 0);
    }

    #[test]
    fn test_properties_cap_keeps_counting() {
        let graph = graph_of(
            (0..5)
                .map(|i| {
                    Triple::new(
                        node("http://ex.org/s"),
                        node(&format!("http://ex.org/p{i}")),
                        Literal::new_simple_literal("v"),
                    )
                })
                .collect(),
        );

        let extraction = extract(&graph, Category::Properties, 2);

        assert_eq!(extraction.items.len(), 2);
        assert_eq!(extraction.count, 5);
    }

    #[test]
    fn test_entities_count_subjects_and_objects() {
        let graph = graph_of(vec![
            Triple::new(
                node("http://ex.org/s"),
                node("http://ex.org/p"),
                node("http://ex.org/o"),
            ),
            Triple::new(
                BlankNode::default(),
                node("http://ex.org/p"),
                Literal::new_simple_literal("v"),
            ),
        ]);

        let extraction = extract(&graph, Category::Entities, 1);

        assert_eq!(extraction.count, 2);
        assert_eq!(extraction.items.len(), 1);
    }

    #[test]
    fn test_malformed_date_literal_is_skipped_and_not_counted() {
        let graph = graph_of(vec![
            Triple::new(
                node("http://ex.org/s"),
                node("http://ex.org/name"),
                Literal::new_simple_literal("Alice"),
            ),
            Triple::new(
                node("http://ex.org/s"),
                node("http://ex.org/born"),
                Literal::new_typed_literal("not-a-date", xsd::DATE_TIME),
            ),
        ]);

        let extraction = extract(&graph, Category::Literals, 10);

        assert_eq!(extraction.items, vec!["Alice".to_string()]);
        assert_eq!(extraction.count, 1);
    }

    #[test]
    fn test_literal_native_rendering() {
        let date_time = Literal::new_typed_literal("2021-03-04T05:06:07", xsd::DATE_TIME);
        assert_eq!(
            literal_to_string(date_time.as_ref()).expect("valid"),
            "2021-03-04 05:06:07"
        );

        let zoned = Literal::new_typed_literal("2021-03-04T05:06:07Z", xsd::DATE_TIME);
        assert_eq!(
            literal_to_string(zoned.as_ref()).expect("valid"),
            "2021-03-04 05:06:07+00:00"
        );

        let fractional = Literal::new_typed_literal("2021-03-04T05:06:07.5", xsd::DATE_TIME);
        assert_eq!(
            literal_to_string(fractional.as_ref()).expect("valid"),
            "2021-03-04 05:06:07.500000"
        );

        let zoned_fraction =
            Literal::new_typed_literal("2021-03-04T05:06:07.25+02:00", xsd::DATE_TIME);
        assert_eq!(
            literal_to_string(zoned_fraction.as_ref()).expect("valid"),
            "2021-03-04 05:06:07.250000+02:00"
        );

        let time = Literal::new_typed_literal("05:06:07.125", xsd::TIME);
        assert_eq!(literal_to_string(time.as_ref()).expect("valid"), "05:06:07.125000");

        let whole_time = Literal::new_typed_literal("05:06:07", xsd::TIME);
        assert_eq!(literal_to_string(whole_time.as_ref()).expect("valid"), "05:06:07");

        let date = Literal::new_typed_literal("2021-03-04", xsd::DATE);
        assert_eq!(literal_to_string(date.as_ref()).expect("valid"), "2021-03-04");

        let int = Literal::new_typed_literal("007", xsd::INTEGER);
        assert_eq!(literal_to_string(int.as_ref()).expect("valid"), "7");

        let bad_int = Literal::new_typed_literal("seven", xsd::INTEGER);
        assert_eq!(literal_to_string(bad_int.as_ref()).expect("kept"), "seven");

        let boolean = Literal::new_typed_literal("1", xsd::BOOLEAN);
        assert_eq!(literal_to_string(boolean.as_ref()).expect("valid"), "true");

        let tagged = Literal::new_language_tagged_literal_unchecked("bonjour", "fr");
        assert_eq!(literal_to_string(tagged.as_ref()).expect("valid"), "bonjour");

        let bad_time = Literal::new_typed_literal("25:99", xsd::TIME);
        assert!(literal_to_string(bad_time.as_ref()).is_err());
    }

    #[test]
    fn test_content_bundle_extend_and_empty() {
        let mut dataset = ContentBundle::default();
        assert!(dataset.is_empty());

        let mut file = ContentBundle::default();
        file.set(Category::Literals, vec!["a".to_string()]);
        dataset.extend_from(&file);
        dataset.extend_from(&file);

        assert_eq!(dataset.get(Category::Literals), ["a", "a"]);
        assert!(!dataset.is_empty());
    }

    #[test]
    fn test_content_bundle_json_shape() {
        let bundle = ContentBundle {
            classes: vec!["http://ex.org/A".to_string()],
            ..ContentBundle::default()
        };
        let json = serde_json::to_value(&bundle).expect("serialize");
        assert_eq!(json["classes"][0], "http://ex.org/A");
        assert!(json["literals"].as_array().expect("array").is_empty());
    }

    #[test]
    fn test_category_round_trip_from_str() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
        assert!("nodes".parse::<Category>().is_err());
    }
}
