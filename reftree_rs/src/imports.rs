//! Import statement extraction.
//!
//! Collects plain, aliased, from- and relative imports with their original
//! statement text. The imported-name set feeds upstream resolution: only
//! names that are both referenced and imported are searched across the
//! codebase.

use std::collections::HashSet;

use tree_sitter::Node;

use crate::parse::{node_text, parse_tree, walk_nodes};
use crate::types::ImportStatement;

/// Extract all import statements from Python source. Source that does not
/// parse yields an empty list.
pub fn extract_imports(source: &str) -> Vec<ImportStatement> {
    match parse_tree(source) {
        Some(tree) if !tree.root_node().has_error() => {
            collect_imports(tree.root_node(), source)
        }
        _ => Vec::new(),
    }
}

/// Collect import statements from an already-parsed tree.
pub(crate) fn collect_imports(root: Node, source: &str) -> Vec<ImportStatement> {
    let mut imports = Vec::new();
    walk_nodes(root, &mut |node| match node.kind() {
        "import_statement" => collect_plain_import(node, source, &mut imports),
        "import_from_statement" => collect_from_import(node, source, &mut imports),
        _ => {}
    });
    imports
}

/// `import a.b` / `import a.b as c`, one statement per imported module.
fn collect_plain_import(node: Node, source: &str, imports: &mut Vec<ImportStatement>) {
    let original_line = node_text(node, source).to_string();
    let line = node.start_position().row + 1;

    let mut cursor = node.walk();
    for item in node.children_by_field_name("name", &mut cursor) {
        let (module, alias) = match item.kind() {
            "aliased_import" => {
                let module = item
                    .child_by_field_name("name")
                    .map(|n| node_text(n, source).to_string())
                    .unwrap_or_default();
                let alias = item
                    .child_by_field_name("alias")
                    .map(|n| node_text(n, source).to_string());
                (module, alias)
            }
            _ => (node_text(item, source).to_string(), None),
        };
        if module.is_empty() {
            continue;
        }
        imports.push(ImportStatement {
            module,
            names: Vec::new(),
            alias,
            level: 0,
            original_line: original_line.clone(),
            line,
        });
    }
}

/// `from a.b import c, d as e` / `from . import f` / `from a import *`.
fn collect_from_import(node: Node, source: &str, imports: &mut Vec<ImportStatement>) {
    let original_line = node_text(node, source).to_string();
    let line = node.start_position().row + 1;

    let (module, level) = match node.child_by_field_name("module_name") {
        Some(module_node) => {
            let raw = node_text(module_node, source);
            let level = raw.bytes().take_while(|b| *b == b'.').count();
            (raw.trim_start_matches('.').to_string(), level)
        }
        None => (String::new(), 0),
    };

    let mut names = Vec::new();
    let mut cursor = node.walk();
    for item in node.children_by_field_name("name", &mut cursor) {
        let name = match item.kind() {
            "aliased_import" => item
                .child_by_field_name("name")
                .map(|n| node_text(n, source).to_string())
                .unwrap_or_default(),
            _ => node_text(item, source).to_string(),
        };
        if !name.is_empty() {
            names.push(name);
        }
    }

    let mut wildcard = false;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "wildcard_import" {
            wildcard = true;
        }
    }
    if wildcard {
        names.push("*".to_string());
    }

    imports.push(ImportStatement {
        module,
        names,
        alias: None,
        level,
        original_line,
        line,
    });
}

/// Names an import set makes visible in the importing module: from-import
/// symbols plus the accessible segments of plain module imports (alias when
/// present, otherwise first and last path segment).
pub fn imported_names(imports: &[ImportStatement]) -> HashSet<String> {
    let mut names = HashSet::new();
    for import in imports {
        if import.names.is_empty() {
            if let Some(alias) = &import.alias {
                names.insert(alias.clone());
            } else {
                for segment in [
                    import.module.split('.').next(),
                    import.module.split('.').next_back(),
                ]
                .into_iter()
                .flatten()
                {
                    if !segment.is_empty() {
                        names.insert(segment.to_string());
                    }
                }
            }
        } else {
            for name in &import.names {
                if name != "*" {
                    names.insert(name.clone());
                }
            }
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plain_and_aliased_imports() {
        let imports = extract_imports("import os\nimport numpy as np\nimport os.path\n");
        assert_eq!(imports.len(), 3);
        assert_eq!(imports[0].module, "os");
        assert_eq!(imports[0].alias, None);
        assert_eq!(imports[1].module, "numpy");
        assert_eq!(imports[1].alias.as_deref(), Some("np"));
        assert_eq!(imports[2].module, "os.path");
        assert_eq!(imports[2].line, 3);
    }

    #[test]
    fn extracts_from_imports_with_names() {
        let imports = extract_imports("from pkg.mod import alpha, beta as b\n");
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].module, "pkg.mod");
        assert_eq!(imports[0].names, vec!["alpha", "beta"]);
        assert_eq!(imports[0].level, 0);
        assert!(imports[0].original_line.starts_with("from pkg.mod"));
    }

    #[test]
    fn relative_import_level_counts_dots() {
        let imports = extract_imports("from ..core import engine\nfrom . import api\n");
        assert_eq!(imports[0].module, "core");
        assert_eq!(imports[0].level, 2);
        assert_eq!(imports[1].module, "");
        assert_eq!(imports[1].level, 1);
        assert_eq!(imports[1].names, vec!["api"]);
    }

    #[test]
    fn wildcard_import_is_star() {
        let imports = extract_imports("from helpers import *\n");
        assert_eq!(imports[0].names, vec!["*"]);
    }

    #[test]
    fn one_statement_per_comma_module() {
        let imports = extract_imports("import json, sys\n");
        let modules: Vec<&str> = imports.iter().map(|i| i.module.as_str()).collect();
        assert_eq!(modules, vec!["json", "sys"]);
    }

    #[test]
    fn imported_names_cover_aliases_and_segments() {
        let imports = extract_imports(
            "import os.path\nimport numpy as np\nfrom app.models import Worker\n",
        );
        let names = imported_names(&imports);
        assert!(names.contains("os"));
        assert!(names.contains("path"));
        assert!(names.contains("np"));
        assert!(names.contains("Worker"));
        assert!(!names.contains("numpy"));
        assert!(!names.contains("models"));
    }

    #[test]
    fn broken_source_yields_no_imports() {
        assert!(extract_imports("import (((\n").is_empty());
    }
}
