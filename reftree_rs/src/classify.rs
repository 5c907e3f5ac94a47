//! Reference classification between a candidate entity and a target name.
//!
//! An ordered list of detectors is evaluated top to bottom and the first
//! kind with at least one match wins: inheritance, import, function call,
//! instantiation, attribute access, bare name. A cheap substring pre-check
//! gates the parse; it can flag names that only occur in strings or
//! comments, which fall through to `name_reference`, but it never misses a
//! syntactically real reference.
//!
//! Vibecrafted with AI Agents by VetCoders (c)2025 The Loctree Team

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tree_sitter::{Node, Query, QueryCursor, StreamingIterator};

use crate::imports;
use crate::parse::{node_text, parse_tree, python_language};
use crate::resolver::is_name_node;
use crate::types::DependencyKind;

/// One location where a reference matched.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchSite {
    pub line: usize,
    pub note: String,
}

/// Result of classifying one candidate/target pair.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Classification {
    pub kind: DependencyKind,
    pub sites: Vec<MatchSite>,
}

type Detector = for<'t> fn(Node<'t>, &str, &str) -> Option<Vec<MatchSite>>;

/// Precedence order; the first detector reporting a match decides the kind.
const DETECTORS: &[(DependencyKind, Detector)] = &[
    (DependencyKind::Inheritance, check_inheritance),
    (DependencyKind::Import, check_imports),
    (DependencyKind::FunctionCall, check_function_calls),
    (DependencyKind::Instantiation, check_instantiation),
    (DependencyKind::AttributeAccess, check_attribute_access),
];

/// Decide whether `candidate_source` references `target_name` and how.
///
/// Returns `None` for unrelated pairs. A candidate body that does not parse
/// classifies as `unknown_reference`; a body that contains the name without
/// any structural match classifies as `name_reference`.
pub fn classify_reference(candidate_source: &str, target_name: &str) -> Option<Classification> {
    if !candidate_source.contains(target_name) {
        return None;
    }

    let Some(tree) = parse_tree(candidate_source) else {
        return Some(Classification {
            kind: DependencyKind::UnknownReference,
            sites: Vec::new(),
        });
    };
    if tree.root_node().has_error() {
        return Some(Classification {
            kind: DependencyKind::UnknownReference,
            sites: Vec::new(),
        });
    }

    let root = tree.root_node();
    for (kind, detector) in DETECTORS {
        if let Some(sites) = detector(root, candidate_source, target_name) {
            return Some(Classification { kind: *kind, sites });
        }
    }

    Some(Classification {
        kind: DependencyKind::NameReference,
        sites: Vec::new(),
    })
}

fn inheritance_query() -> &'static Query {
    static QUERY: OnceLock<Query> = OnceLock::new();
    QUERY.get_or_init(|| {
        Query::new(
            &python_language(),
            r#"
            (class_definition
              name: (identifier) @class
              superclasses: (argument_list (identifier) @base))
            "#,
        )
        .expect("inheritance query must compile")
    })
}

fn call_query() -> &'static Query {
    static QUERY: OnceLock<Query> = OnceLock::new();
    QUERY.get_or_init(|| {
        Query::new(
            &python_language(),
            r#"
            (call
              function: (identifier) @direct)

            (call
              function: (attribute
                attribute: (identifier) @method))
            "#,
        )
        .expect("call query must compile")
    })
}

fn attribute_query() -> &'static Query {
    static QUERY: OnceLock<Query> = OnceLock::new();
    QUERY.get_or_init(|| {
        Query::new(
            &python_language(),
            r#"(attribute attribute: (identifier) @attr)"#,
        )
        .expect("attribute query must compile")
    })
}

/// Target appears in a class's base list.
fn check_inheritance(root: Node, source: &str, target: &str) -> Option<Vec<MatchSite>> {
    let query = inheritance_query();
    let class_idx = query.capture_index_for_name("class")?;
    let base_idx = query.capture_index_for_name("base")?;

    let mut sites = Vec::new();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, root, source.as_bytes());
    while let Some(m) = matches.next() {
        let Some(base) = m.captures.iter().find(|c| c.index == base_idx) else {
            continue;
        };
        if node_text(base.node, source) != target {
            continue;
        }
        let class_name = m
            .captures
            .iter()
            .find(|c| c.index == class_idx)
            .map(|c| node_text(c.node, source))
            .unwrap_or("");
        sites.push(MatchSite {
            line: base.node.start_position().row + 1,
            note: format!("class {} inherits {}", class_name, target),
        });
    }

    if sites.is_empty() { None } else { Some(sites) }
}

/// Target appears as a direct import, dotted-import suffix, or from-import
/// symbol.
fn check_imports(root: Node, source: &str, target: &str) -> Option<Vec<MatchSite>> {
    let dotted_suffix = format!(".{}", target);
    let mut sites = Vec::new();

    for import in imports::collect_imports(root, source) {
        if import.names.is_empty() {
            if import.module == target || import.module.ends_with(&dotted_suffix) {
                let note = match &import.alias {
                    Some(alias) => format!("import {} as {}", import.module, alias),
                    None => format!("import {}", import.module),
                };
                sites.push(MatchSite { line: import.line, note });
            }
        } else if import.names.iter().any(|name| name == target) {
            sites.push(MatchSite {
                line: import.line,
                note: format!("from {} import {}", import.module, target),
            });
        }
    }

    if sites.is_empty() { None } else { Some(sites) }
}

/// Target called directly or as a method on some receiver.
fn check_function_calls(root: Node, source: &str, target: &str) -> Option<Vec<MatchSite>> {
    let query = call_query();
    let direct_idx = query.capture_index_for_name("direct")?;

    let mut sites = Vec::new();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, root, source.as_bytes());
    while let Some(m) = matches.next() {
        for capture in m.captures {
            if node_text(capture.node, source) != target {
                continue;
            }
            let note = if capture.index == direct_idx {
                "direct call"
            } else {
                "method call"
            };
            sites.push(MatchSite {
                line: capture.node.start_position().row + 1,
                note: note.to_string(),
            });
        }
    }

    if sites.is_empty() { None } else { Some(sites) }
}

/// Target invoked as a call that syntactically looks like construction.
/// Same callee test as `check_function_calls`, tracked separately with
/// argument counts.
fn check_instantiation(root: Node, source: &str, target: &str) -> Option<Vec<MatchSite>> {
    let query = call_query();
    let direct_idx = query.capture_index_for_name("direct")?;

    let mut sites = Vec::new();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, root, source.as_bytes());
    while let Some(m) = matches.next() {
        for capture in m.captures {
            if capture.index != direct_idx || node_text(capture.node, source) != target {
                continue;
            }
            let args = capture
                .node
                .parent()
                .and_then(|call| call.child_by_field_name("arguments"))
                .map(|arguments| {
                    let mut cursor = arguments.walk();
                    arguments
                        .named_children(&mut cursor)
                        .filter(|n| n.kind() != "keyword_argument")
                        .count()
                })
                .unwrap_or(0);
            sites.push(MatchSite {
                line: capture.node.start_position().row + 1,
                note: format!("constructed with {} args", args),
            });
        }
    }

    if sites.is_empty() { None } else { Some(sites) }
}

/// Target accessed as an attribute, or present as a bare loaded name.
fn check_attribute_access(root: Node, source: &str, target: &str) -> Option<Vec<MatchSite>> {
    let query = attribute_query();
    let mut sites = Vec::new();

    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, root, source.as_bytes());
    while let Some(m) = matches.next() {
        for capture in m.captures {
            if node_text(capture.node, source) == target {
                sites.push(MatchSite {
                    line: capture.node.start_position().row + 1,
                    note: "attribute access".to_string(),
                });
            }
        }
    }

    crate::parse::walk_nodes(root, &mut |node| {
        if node.kind() == "identifier"
            && is_name_node(node)
            && node_text(node, source) == target
        {
            sites.push(MatchSite {
                line: node.start_position().row + 1,
                note: "name reference".to_string(),
            });
        }
    });

    if sites.is_empty() { None } else { Some(sites) }
}
