//! Python parsing and top-level entity extraction.
//!
//! Walks the tree-sitter syntax tree and extracts entities that are direct
//! children of the module body. Nested and local definitions are not
//! entities; a decorated definition spans from its first decorator line.
//!
//! Vibecrafted with AI Agents by VetCoders (c)2025 The Loctree Team

use std::path::Path;

use anyhow::{Context, Result, bail};
use tree_sitter::{Language, Node, Parser, Tree};

use crate::types::{CodeEntity, EntityKind};

pub(crate) fn python_language() -> Language {
    tree_sitter_python::LANGUAGE.into()
}

/// Parse source into a raw tree. `None` only when the grammar fails to
/// load or parsing is interrupted, which does not happen in practice.
pub(crate) fn parse_tree(source: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    parser.set_language(&python_language()).ok()?;
    parser.parse(source.as_bytes(), None)
}

/// Parse a Python file into its top-level entities plus the raw tree.
pub fn parse_file(path: &Path) -> Result<(Vec<CodeEntity>, Tree)> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_source(&source, &crate::fs_utils::display_path(path))
}

/// Parse Python source text into its top-level entities plus the raw tree.
///
/// A tree containing syntax errors is rejected wholesale; callers that
/// tolerate broken files degrade to an empty entity list instead.
pub fn parse_source(source: &str, file_path: &str) -> Result<(Vec<CodeEntity>, Tree)> {
    let Some(tree) = parse_tree(source) else {
        bail!("parser produced no tree for {}", file_path);
    };
    if tree.root_node().has_error() {
        bail!("invalid Python syntax in {}", file_path);
    }

    let lines: Vec<&str> = source.lines().collect();
    let mut entities = Vec::new();
    {
        let root = tree.root_node();
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "function_definition" | "class_definition" => {
                    if let Some(entity) = extract_entity(child, child, source, &lines, file_path) {
                        entities.push(entity);
                    }
                }
                "decorated_definition" => {
                    if let Some(def) = child.child_by_field_name("definition")
                        && matches!(def.kind(), "function_definition" | "class_definition")
                        && let Some(entity) = extract_entity(def, child, source, &lines, file_path)
                    {
                        entities.push(entity);
                    }
                }
                _ => {}
            }
        }
    }

    Ok((entities, tree))
}

/// Build a `CodeEntity` from a definition node. `span` is the outermost
/// node for line accounting: the `decorated_definition` wrapper when
/// decorators are present, the definition itself otherwise.
fn extract_entity(
    def: Node,
    span: Node,
    source: &str,
    lines: &[&str],
    file_path: &str,
) -> Option<CodeEntity> {
    let name = def
        .child_by_field_name("name")?
        .utf8_text(source.as_bytes())
        .ok()?
        .to_string();

    let kind = if def.kind() == "class_definition" {
        EntityKind::Class
    } else {
        EntityKind::Function
    };

    let line_start = span.start_position().row + 1;
    let line_end = (span.end_position().row + 1).min(lines.len().max(1));
    let source_text = lines[line_start - 1..line_end].join("\n");

    Some(CodeEntity {
        name,
        kind,
        file_path: file_path.to_string(),
        line_start,
        line_end,
        source_text,
    })
}

/// Walk every node of a subtree, calling `visit` on each.
pub(crate) fn walk_nodes<'t>(node: Node<'t>, visit: &mut impl FnMut(Node<'t>)) {
    visit(node);
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_nodes(child, visit);
    }
}

/// Text of a node, empty when the span is not valid UTF-8.
pub(crate) fn node_text<'s>(node: Node, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}
