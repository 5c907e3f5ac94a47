//! Human and JSON rendering of dependency trees.
//!
//! Every format is a pure projection of a completed tree; the engine never
//! prints. Color goes through `console::style` and is resolved once from
//! the CLI color mode.

use std::io::IsTerminal;

use console::style;

use crate::query;
use crate::types::{
    ColorMode, DependencyNode, DependencyTree, Direction, ReportFormat,
};

/// How many nodes the graph format exports at most.
const GRAPH_NODE_LIMIT: usize = 150;

/// How many nodes to list per depth group before eliding.
const DEPTH_GROUP_PREVIEW: usize = 5;

pub struct RenderOptions {
    pub show_upstream: bool,
    pub show_downstream: bool,
    pub color: bool,
}

/// Resolve a color mode against the actual stdout terminal state.
pub fn resolve_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => std::io::stdout().is_terminal(),
    }
}

/// Render the tree in the requested human format.
pub fn render(tree: &DependencyTree, format: ReportFormat, opts: &RenderOptions) -> String {
    let mut out = match format {
        ReportFormat::Tree => render_tree(tree, opts),
        ReportFormat::List => render_list(tree, opts),
        ReportFormat::Depths => render_depths(tree, opts),
        ReportFormat::Paths => render_paths(tree, opts),
        ReportFormat::Graph => render_graph(tree, opts),
    };

    if tree.truncated() {
        out.push_str(&format!(
            "\n[!] node cap reached ({}); traversal was truncated\n",
            tree.max_nodes
        ));
    }
    out
}

/// Serialize the whole tree, registry included, as pretty JSON.
pub fn render_json(tree: &DependencyTree) -> String {
    serde_json::to_string_pretty(tree).expect("dependency tree serializes")
}

fn header(tree: &DependencyTree, title: &str, opts: &RenderOptions) -> String {
    let name = if opts.color {
        style(tree.target.name.as_str()).cyan().bold().to_string()
    } else {
        tree.target.name.clone()
    };
    format!(
        "{} {} ({})\n  {}:{}-{}\n",
        title,
        name,
        tree.target.kind,
        tree.target.file_path,
        tree.target.line_start,
        tree.target.line_end
    )
}

fn render_tree(tree: &DependencyTree, opts: &RenderOptions) -> String {
    let mut out = header(tree, "Dependency tree for:", opts);

    if opts.show_upstream {
        out.push('\n');
        out.push_str("UPSTREAM (what this depends on):\n");
        out.push_str(&render_branch(&tree.upstream, opts));
    }
    if opts.show_downstream {
        out.push('\n');
        out.push_str("DOWNSTREAM (what depends on this):\n");
        out.push_str(&render_branch(&tree.downstream, opts));
    }
    out
}

fn render_branch(events: &[DependencyNode], opts: &RenderOptions) -> String {
    if events.is_empty() {
        return "  (none)\n".to_string();
    }

    let mut out = String::new();
    for node in events {
        let level = node.depth.unsigned_abs() as usize;
        let indent = "    ".repeat(level.saturating_sub(1));
        let name = if opts.color {
            style(node.name.as_str()).green().to_string()
        } else {
            node.name.clone()
        };
        out.push_str(&format!(
            "  {}├── {} ({}) [{}]\n",
            indent, name, node.kind, node.dependency_kind
        ));
        out.push_str(&format!("  {}│     {}\n", indent, node.location()));
    }
    out
}

fn render_list(tree: &DependencyTree, opts: &RenderOptions) -> String {
    let mut out = header(tree, "All dependencies for:", opts);
    out.push('\n');

    let nodes = flatten_shown(tree, opts);
    if nodes.is_empty() {
        out.push_str("  (none)\n");
        return out;
    }
    for (i, node) in nodes.iter().enumerate() {
        out.push_str(&format!(
            "{:3}. {} ({}) - {}\n     {}\n",
            i + 1,
            node.name,
            node.kind,
            node.dependency_kind,
            node.location()
        ));
    }
    out
}

fn render_depths(tree: &DependencyTree, opts: &RenderOptions) -> String {
    let mut out = header(tree, "Depth analysis for:", opts);
    out.push('\n');

    for (depth, nodes) in query::group_by_depth(tree) {
        if depth == 0 {
            continue;
        }
        let shown: Vec<&DependencyNode> = nodes
            .iter()
            .filter(|n| direction_shown(n, opts))
            .collect();
        if shown.is_empty() {
            continue;
        }
        out.push_str(&format!("Depth {}: {} dependencies\n", depth, shown.len()));
        for node in shown.iter().take(DEPTH_GROUP_PREVIEW) {
            let mut path = node.dependency_path.clone();
            path.push(node.name.clone());
            out.push_str(&format!(
                "  {} [{}]\n    path: {}\n    {}\n",
                node.name,
                node.dependency_kind,
                path.join(" -> "),
                node.location()
            ));
        }
        if shown.len() > DEPTH_GROUP_PREVIEW {
            out.push_str(&format!(
                "  ... and {} more at depth {}\n",
                shown.len() - DEPTH_GROUP_PREVIEW,
                depth
            ));
        }
        out.push('\n');
    }
    out
}

fn render_paths(tree: &DependencyTree, opts: &RenderOptions) -> String {
    let mut out = header(tree, "Dependency paths for:", opts);
    out.push('\n');

    let mut nodes: Vec<&DependencyNode> = tree
        .node_registry
        .values()
        .filter(|n| n.depth != 0 && direction_shown(n, opts))
        .collect();
    nodes.sort_by(|a, b| {
        (a.depth.unsigned_abs(), a.file_path.as_str(), a.line_start).cmp(&(
            b.depth.unsigned_abs(),
            b.file_path.as_str(),
            b.line_start,
        ))
    });

    if nodes.is_empty() {
        out.push_str("  (none)\n");
        return out;
    }
    for node in nodes {
        if let Some(path) = query::path_to(tree, &node.id()) {
            out.push_str(&format!("  {}\n", path.join(" -> ")));
        }
    }
    out
}

fn render_graph(tree: &DependencyTree, opts: &RenderOptions) -> String {
    let mut out = header(tree, "Dependency graph for:", opts);

    let subset = query::bounded_subset(tree, GRAPH_NODE_LIMIT);
    let ids: std::collections::HashSet<_> = subset.iter().map(|n| n.id()).collect();
    let mut edges = Vec::new();
    for node in &subset {
        if let Some(parent) = &node.parent
            && ids.contains(parent)
        {
            edges.push(format!(
                "  {} -> {} [{}]",
                parent,
                node.id(),
                node.dependency_kind
            ));
        }
    }

    out.push_str(&format!("Nodes: {}\nEdges: {}\n", subset.len(), edges.len()));
    if !edges.is_empty() {
        out.push_str("\nEdges:\n");
        for edge in edges {
            out.push_str(&edge);
            out.push('\n');
        }
    }
    out
}

fn flatten_shown(tree: &DependencyTree, opts: &RenderOptions) -> Vec<DependencyNode> {
    match (opts.show_upstream, opts.show_downstream) {
        (true, true) => query::flatten(tree, None),
        (true, false) => query::flatten(tree, Some(Direction::Upstream)),
        (false, true) => query::flatten(tree, Some(Direction::Downstream)),
        (false, false) => Vec::new(),
    }
}

fn direction_shown(node: &DependencyNode, opts: &RenderOptions) -> bool {
    if node.depth < 0 {
        opts.show_upstream
    } else {
        opts.show_downstream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deptree::build_dependency_tree;
    use crate::types::EntityKind;
    use std::path::{Path, PathBuf};

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).expect("write fixture");
        path
    }

    fn sample_tree() -> DependencyTree {
        let tmp = tempfile::tempdir().expect("tmp dir");
        let a = write(
            tmp.path(),
            "a.py",
            "def helper():\n    return 1\n\n\nclass Worker:\n    def run(self):\n        return helper()\n",
        );
        write(
            tmp.path(),
            "b.py",
            "from a import Worker\n\n\ndef launch():\n    return Worker()\n",
        );
        build_dependency_tree(&a, "Worker", EntityKind::Class, None, Some(tmp.path()))
            .expect("build")
    }

    fn plain() -> RenderOptions {
        RenderOptions {
            show_upstream: true,
            show_downstream: true,
            color: false,
        }
    }

    #[test]
    fn tree_format_shows_both_sections() {
        let tree = sample_tree();
        let out = render(&tree, ReportFormat::Tree, &plain());
        assert!(out.contains("Dependency tree for: Worker (class)"));
        assert!(out.contains("UPSTREAM (what this depends on):"));
        assert!(out.contains("helper (function) [internal_reference]"));
        assert!(out.contains("DOWNSTREAM (what depends on this):"));
        assert!(out.contains("launch (function) [function_call]"));
    }

    #[test]
    fn direction_filters_hide_sections() {
        let tree = sample_tree();
        let out = render(
            &tree,
            ReportFormat::Tree,
            &RenderOptions { show_upstream: true, show_downstream: false, color: false },
        );
        assert!(out.contains("UPSTREAM"));
        assert!(!out.contains("DOWNSTREAM"));
        assert!(!out.contains("launch"));
    }

    #[test]
    fn list_format_numbers_unique_nodes() {
        let tree = sample_tree();
        let out = render(&tree, ReportFormat::List, &plain());
        assert!(out.contains("  1. helper (function) - internal_reference"));
        assert!(out.contains("  2. launch (function) - function_call"));
    }

    #[test]
    fn depths_format_groups_by_absolute_depth() {
        let tree = sample_tree();
        let out = render(&tree, ReportFormat::Depths, &plain());
        assert!(out.contains("Depth 1: 2 dependencies"));
        assert!(out.contains("path: Worker -> helper"));
    }

    #[test]
    fn paths_format_prints_arrow_chains() {
        let tree = sample_tree();
        let out = render(&tree, ReportFormat::Paths, &plain());
        assert!(out.contains("  Worker -> helper"));
        assert!(out.contains("  Worker -> launch"));
    }

    #[test]
    fn graph_format_counts_nodes_and_edges() {
        let tree = sample_tree();
        let out = render(&tree, ReportFormat::Graph, &plain());
        assert!(out.contains("Nodes: 3"));
        assert!(out.contains("Edges: 2"));
        assert!(out.contains("[internal_reference]"));
    }

    #[test]
    fn json_output_contains_registry_and_events() {
        let tree = sample_tree();
        let json: serde_json::Value =
            serde_json::from_str(&render_json(&tree)).expect("valid JSON");
        assert_eq!(json["target"]["name"], "Worker");
        assert_eq!(json["target"]["depth"], 0);
        assert!(json["node_registry"].as_object().expect("registry").len() >= 3);
        assert_eq!(json["upstream"][0]["dependency_kind"], "internal_reference");
    }
}
