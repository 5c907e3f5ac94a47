//! Name usage and import resolution over entity bodies.
//!
//! The resolver answers three questions about a chunk of Python source:
//! which names it uses (and in what role), which same-file entities it
//! depends on, and which of a file's imports it actually needs.
//!
//! Vibecrafted with AI Agents by VetCoders (c)2025 The Loctree Team

use std::collections::HashSet;

use tree_sitter::Node;

use crate::parse::{node_text, parse_tree, walk_nodes};
use crate::types::{ImportStatement, NameContext, UsedName};

/// Find all names used in the source that might require an import.
///
/// Call callees report as `function_call`, receivers of method calls as
/// `module_reference`, attribute bases as `attribute_access`, and any other
/// loaded name as `name_reference`. A node can contribute under more than
/// one role, matching how the checks overlap in practice.
pub fn find_used_names(source: &str) -> Vec<UsedName> {
    let Some(tree) = parse_tree(source) else {
        return Vec::new();
    };

    let mut used = Vec::new();
    walk_nodes(tree.root_node(), &mut |node| {
        let line = node.start_position().row + 1;
        match node.kind() {
            "call" => {
                if let Some(function) = node.child_by_field_name("function") {
                    if function.kind() == "identifier" {
                        used.push(UsedName {
                            name: node_text(function, source).to_string(),
                            context: NameContext::FunctionCall,
                            line,
                        });
                    } else if function.kind() == "attribute"
                        && let Some(object) = function.child_by_field_name("object")
                        && object.kind() == "identifier"
                    {
                        used.push(UsedName {
                            name: node_text(object, source).to_string(),
                            context: NameContext::ModuleReference,
                            line,
                        });
                    }
                }
            }
            "attribute" => {
                if let Some(object) = node.child_by_field_name("object")
                    && object.kind() == "identifier"
                {
                    used.push(UsedName {
                        name: node_text(object, source).to_string(),
                        context: NameContext::AttributeAccess,
                        line,
                    });
                }
            }
            "identifier" => {
                if is_name_node(node) && !is_store_target(node) {
                    used.push(UsedName {
                        name: node_text(node, source).to_string(),
                        context: NameContext::NameReference,
                        line,
                    });
                }
            }
            _ => {}
        }
    });
    used
}

/// Names of other same-file entities referenced by `source`.
///
/// Only names present in `known_names` qualify; the entity's own name is
/// excluded. The result is deduplicated and alphabetically sorted.
pub fn find_entity_dependencies(
    entity_name: &str,
    source: &str,
    known_names: &[String],
) -> Vec<String> {
    let Some(tree) = parse_tree(source) else {
        return Vec::new();
    };
    if tree.root_node().has_error() {
        return Vec::new();
    }

    let known: HashSet<&str> = known_names.iter().map(String::as_str).collect();
    let mut found: HashSet<String> = HashSet::new();
    walk_nodes(tree.root_node(), &mut |node| {
        if node.kind() == "identifier" && is_name_node(node) {
            let text = node_text(node, source);
            if text != entity_name && known.contains(text) {
                found.insert(text.to_string());
            }
        }
    });

    let mut deps: Vec<String> = found.into_iter().collect();
    deps.sort();
    deps
}

/// Keep only the imports actually needed for the given used names.
pub fn resolve_required_imports(
    used_names: &[UsedName],
    available_imports: &[ImportStatement],
) -> Vec<ImportStatement> {
    let used: HashSet<&str> = used_names.iter().map(|u| u.name.as_str()).collect();
    available_imports
        .iter()
        .filter(|import| is_import_needed(import, &used))
        .cloned()
        .collect()
}

fn is_import_needed(import: &ImportStatement, used: &HashSet<&str>) -> bool {
    // "import module" / "import module as alias"
    if import.names.is_empty() {
        let check_name = import
            .alias
            .as_deref()
            .or_else(|| import.module.split('.').next_back())
            .unwrap_or("");
        return used.contains(check_name);
    }

    // "from module import name1, name2"; star imports are kept, they can
    // satisfy any name.
    import
        .names
        .iter()
        .any(|name| name == "*" || used.contains(name.as_str()))
}

/// True when the identifier corresponds to a Python `Name` node: attribute
/// members, import paths and binding-position names (def/class names,
/// parameters, keyword-argument keys) do not.
pub(crate) fn is_name_node(node: Node) -> bool {
    let Some(parent) = node.parent() else {
        return true;
    };
    match parent.kind() {
        "attribute" => parent
            .child_by_field_name("attribute")
            .is_none_or(|n| n.id() != node.id()),
        // Default values are loads; the parameter name itself is not.
        "default_parameter" | "typed_default_parameter" => parent
            .child_by_field_name("name")
            .is_none_or(|n| n.id() != node.id()),
        "function_definition" | "class_definition" | "keyword_argument" => parent
            .child_by_field_name("name")
            .is_none_or(|n| n.id() != node.id()),
        "dotted_name" | "aliased_import" | "relative_import" | "global_statement"
        | "nonlocal_statement" | "parameters" | "lambda_parameters" | "typed_parameter"
        | "list_splat_pattern" | "dictionary_splat_pattern" => false,
        _ => true,
    }
}

/// True when the identifier is the target of a binding rather than a load.
fn is_store_target(node: Node) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    match parent.kind() {
        "assignment" | "augmented_assignment" | "for_statement" | "for_in_clause" => parent
            .child_by_field_name("left")
            .is_some_and(|n| n.id() == node.id()),
        "named_expression" => parent
            .child_by_field_name("name")
            .is_some_and(|n| n.id() == node.id()),
        "pattern_list" | "tuple_pattern" | "list_pattern" | "list_splat_pattern"
        | "as_pattern_target" => true,
        _ => false,
    }
}
