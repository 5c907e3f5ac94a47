//! Dependency tree construction: the traversal core.
//!
//! One `TreeBuilder` owns all mutable state for one build: the per-file
//! entity cache, the per-direction visited set, and the node registry.
//! Traversal is depth-first with a path-scoped cycle guard: an entity key
//! is marked before recursing and unmarked on return, so a shared
//! dependency reachable via two paths is rediscovered once per path with
//! its own `dependency_path`. This is deliberate; memoizing across paths
//! would collapse those contexts.
//!
//! Vibecrafted with AI Agents by VetCoders (c)2025 The Loctree Team

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

use crate::classify;
use crate::fs_utils;
use crate::index::FileIndex;
use crate::imports;
use crate::resolver;
use crate::types::{
    CodeEntity, DEFAULT_NODE_CAP, DependencyKind, DependencyNode, DependencyTree, Direction,
    EntityKind, NodeId,
};

/// Build a dependency tree for one entity with default limits.
///
/// `codebase_root` defaults to the parent directory of `file_path`.
pub fn build_dependency_tree(
    file_path: &Path,
    entity_name: &str,
    entity_kind: EntityKind,
    max_depth: Option<usize>,
    codebase_root: Option<&Path>,
) -> Result<DependencyTree> {
    TreeBuilder::new().build(file_path, entity_name, entity_kind, max_depth, codebase_root)
}

/// Traversal state machine for one `build` call.
pub struct TreeBuilder {
    index: FileIndex,
    visited: HashSet<(String, PathBuf)>,
    registry: HashMap<NodeId, DependencyNode>,
    max_nodes: usize,
}

struct WalkContext<'a> {
    direction: Direction,
    root_dir: &'a Path,
    max_depth: Option<usize>,
    root_id: &'a NodeId,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            index: FileIndex::new(),
            visited: HashSet::new(),
            registry: HashMap::new(),
            max_nodes: DEFAULT_NODE_CAP,
        }
    }

    /// Override the registered-node safety cap (default 10,000).
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes.max(1);
        self
    }

    /// Number of files parsed by the most recent build.
    pub fn files_indexed(&self) -> usize {
        self.index.files_indexed()
    }

    /// Build the bidirectional tree for `entity_name` in `file_path`.
    ///
    /// Fails before any traversal when the target entity does not exist;
    /// unreadable or unparsable files encountered during traversal are dead
    /// ends, not errors.
    pub fn build(
        &mut self,
        file_path: &Path,
        entity_name: &str,
        entity_kind: EntityKind,
        max_depth: Option<usize>,
        codebase_root: Option<&Path>,
    ) -> Result<DependencyTree> {
        let root_dir: PathBuf = match codebase_root {
            Some(dir) => dir.to_path_buf(),
            None => file_path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };

        // Fresh state per build; a builder may be reused sequentially but
        // never concurrently.
        self.index.clear();
        self.visited.clear();
        self.registry.clear();

        let target_entity = self
            .index
            .find(file_path, entity_name, entity_kind)
            .ok_or_else(|| self.not_found(file_path, entity_name, entity_kind))?;

        let target_id = NodeId::new(
            &target_entity.name,
            &target_entity.file_path,
            target_entity.line_start,
        );
        self.registry.insert(
            target_id.clone(),
            DependencyNode {
                name: target_entity.name.clone(),
                kind: target_entity.kind,
                file_path: target_entity.file_path.clone(),
                line_start: target_entity.line_start,
                line_end: target_entity.line_end,
                dependency_kind: DependencyKind::Target,
                depth: 0,
                parent: None,
                root: target_id.clone(),
                dependency_path: Vec::new(),
                children: Vec::new(),
            },
        );

        let mut upstream = Vec::new();
        let up_ctx = WalkContext {
            direction: Direction::Upstream,
            root_dir: &root_dir,
            max_depth,
            root_id: &target_id,
        };
        self.walk(&target_entity, file_path, &[], 0, &up_ctx, &mut upstream);

        // Each direction gets its own path scope.
        self.visited.clear();

        let mut downstream = Vec::new();
        let down_ctx = WalkContext {
            direction: Direction::Downstream,
            root_dir: &root_dir,
            max_depth,
            root_id: &target_id,
        };
        self.walk(&target_entity, file_path, &[], 0, &down_ctx, &mut downstream);

        let target = self
            .registry
            .get(&target_id)
            .cloned()
            .expect("target registered before traversal");

        Ok(DependencyTree {
            target,
            upstream,
            downstream,
            node_registry: std::mem::take(&mut self.registry),
            max_nodes: self.max_nodes,
        })
    }

    /// Shared DFS for both directions; only the relationship enumeration
    /// and the depth step differ.
    fn walk(
        &mut self,
        entity: &CodeEntity,
        file: &Path,
        parent_path: &[String],
        depth: i32,
        ctx: &WalkContext,
        events: &mut Vec<DependencyNode>,
    ) {
        let key = entity_key(entity, file);
        if self.visited.contains(&key) {
            // Cyclic reference: this branch ends quietly.
            return;
        }
        if let Some(max) = ctx.max_depth
            && depth.unsigned_abs() as usize >= max
        {
            return;
        }
        self.visited.insert(key.clone());

        let parent_id = NodeId::new(&entity.name, &entity.file_path, entity.line_start);
        let child_depth = match ctx.direction {
            Direction::Upstream => depth - 1,
            Direction::Downstream => depth + 1,
        };
        let mut child_path = parent_path.to_vec();
        child_path.push(entity.name.clone());

        let related = match ctx.direction {
            Direction::Upstream => self.direct_dependencies(entity, file, ctx.root_dir),
            Direction::Downstream => self.direct_dependents(entity, file, ctx.root_dir),
        };

        for (dep_entity, dep_kind, dep_file) in related {
            if self.registry.len() >= self.max_nodes {
                // Safety cap reached: stop adding nodes. Not an error.
                break;
            }

            let node_id = NodeId::new(
                &dep_entity.name,
                &dep_entity.file_path,
                dep_entity.line_start,
            );
            let node = DependencyNode {
                name: dep_entity.name.clone(),
                kind: dep_entity.kind,
                file_path: dep_entity.file_path.clone(),
                line_start: dep_entity.line_start,
                line_end: dep_entity.line_end,
                dependency_kind: dep_kind,
                depth: child_depth,
                parent: Some(parent_id.clone()),
                root: ctx.root_id.clone(),
                dependency_path: child_path.clone(),
                children: Vec::new(),
            };

            // First registration wins; a rediscovery still produces an
            // event with its own path context.
            self.registry
                .entry(node_id.clone())
                .or_insert_with(|| node.clone());
            if let Some(parent_node) = self.registry.get_mut(&parent_id)
                && !parent_node.children.contains(&node_id)
            {
                parent_node.children.push(node_id.clone());
            }
            events.push(node);

            self.walk(&dep_entity, &dep_file, &child_path, child_depth, ctx, events);
        }

        self.visited.remove(&key);
    }

    /// Upstream: same-file references plus referenced-and-imported names
    /// resolved across the rest of the codebase.
    fn direct_dependencies(
        &mut self,
        entity: &CodeEntity,
        file: &Path,
        root_dir: &Path,
    ) -> Vec<(CodeEntity, DependencyKind, PathBuf)> {
        let mut deps = Vec::new();

        let known = self.index.entity_names(file);
        for dep_name in resolver::find_entity_dependencies(&entity.name, &entity.source_text, &known)
        {
            let resolved = self
                .index
                .find(file, &dep_name, EntityKind::Function)
                .or_else(|| self.index.find(file, &dep_name, EntityKind::Class));
            if let Some(dep_entity) = resolved {
                deps.push((dep_entity, DependencyKind::InternalReference, file.to_path_buf()));
            }
        }

        // Only names that are both referenced in the body and imported in
        // this file go to the codebase-wide search; anything looser floods
        // the graph with local-variable collisions.
        let referenced: HashSet<String> = resolver::find_used_names(&entity.source_text)
            .into_iter()
            .map(|u| u.name)
            .collect();
        let imported = imports::imported_names(self.index.imports(file));
        let mut external: Vec<&String> = referenced.intersection(&imported).collect();
        external.sort();

        for name in external {
            for py_file in fs_utils::gather_python_files(root_dir) {
                if fs_utils::same_file(&py_file, file) {
                    continue;
                }
                for found in self.index.entities(&py_file).to_vec() {
                    if &found.name == name {
                        deps.push((found, DependencyKind::ExternalReference, py_file.clone()));
                    }
                }
            }
        }

        deps
    }

    /// Downstream: rescan every other file under the root and classify
    /// each top-level entity against the target name.
    fn direct_dependents(
        &mut self,
        entity: &CodeEntity,
        file: &Path,
        root_dir: &Path,
    ) -> Vec<(CodeEntity, DependencyKind, PathBuf)> {
        let mut deps = Vec::new();
        for py_file in fs_utils::gather_python_files(root_dir) {
            if fs_utils::same_file(&py_file, file) {
                continue;
            }
            for candidate in self.index.entities(&py_file).to_vec() {
                if let Some(classification) =
                    classify::classify_reference(&candidate.source_text, &entity.name)
                {
                    deps.push((candidate, classification.kind, py_file.clone()));
                }
            }
        }
        deps
    }

    fn not_found(&mut self, file: &Path, name: &str, kind: EntityKind) -> anyhow::Error {
        let mut best: Option<(f64, String)> = None;
        for candidate in self.index.entity_names(file) {
            let score = strsim::jaro_winkler(name, &candidate);
            if best.as_ref().is_none_or(|(top, _)| score > *top) {
                best = Some((score, candidate));
            }
        }
        let suggestion = match best {
            Some((score, candidate)) if score >= 0.8 => {
                format!(" (did you mean '{}'?)", candidate)
            }
            _ => String::new(),
        };
        anyhow!(
            "entity '{}' of kind '{}' not found in {}{}",
            name,
            kind,
            file.display(),
            suggestion
        )
    }
}

fn entity_key(entity: &CodeEntity, file: &Path) -> (String, PathBuf) {
    let canonical = file.canonicalize().unwrap_or_else(|_| file.to_path_buf());
    (entity.name.clone(), canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).expect("write fixture");
        path
    }

    const WORKER_FILE: &str = "\
def helper():
    return 1


class Worker:
    def run(self):
        return helper()
";

    #[test]
    fn upstream_finds_same_file_internal_reference() {
        let tmp = tempfile::tempdir().expect("tmp dir");
        let a = write(tmp.path(), "a.py", WORKER_FILE);

        let tree =
            build_dependency_tree(&a, "Worker", EntityKind::Class, Some(1), None).expect("build");

        assert_eq!(tree.upstream.len(), 1);
        let helper = &tree.upstream[0];
        assert_eq!(helper.name, "helper");
        assert_eq!(helper.dependency_kind, DependencyKind::InternalReference);
        assert_eq!(helper.depth, -1);
        assert_eq!(helper.dependency_path, vec!["Worker"]);
        assert_eq!(helper.parent.as_ref(), Some(&tree.target.id()));
        assert!(tree.node_registry[&tree.target.id()]
            .children
            .contains(&helper.id()));
    }

    #[test]
    fn downstream_finds_cross_file_caller() {
        let tmp = tempfile::tempdir().expect("tmp dir");
        let a = write(tmp.path(), "a.py", WORKER_FILE);
        write(
            tmp.path(),
            "b.py",
            "from a import Worker\n\n\ndef launch():\n    w = Worker()\n    return w\n",
        );

        let tree = build_dependency_tree(&a, "Worker", EntityKind::Class, Some(1), Some(tmp.path()))
            .expect("build");

        assert_eq!(tree.downstream.len(), 1);
        let launch = &tree.downstream[0];
        assert_eq!(launch.name, "launch");
        assert_eq!(launch.dependency_kind, DependencyKind::FunctionCall);
        assert_eq!(launch.depth, 1);
        assert!(launch.file_path.ends_with("b.py"));
    }

    #[test]
    fn registry_holds_target_at_depth_zero() {
        let tmp = tempfile::tempdir().expect("tmp dir");
        let a = write(tmp.path(), "a.py", WORKER_FILE);

        let tree =
            build_dependency_tree(&a, "Worker", EntityKind::Class, None, None).expect("build");

        let registered = &tree.node_registry[&tree.target.id()];
        assert_eq!(registered.depth, 0);
        assert_eq!(registered.dependency_kind, DependencyKind::Target);
        assert_eq!(tree.target.depth, 0);
        assert!(tree.target.parent.is_none());
        assert!(tree.upstream.iter().all(|n| n.depth < 0));
        assert!(tree.downstream.iter().all(|n| n.depth > 0));
    }

    #[test]
    fn max_depth_zero_yields_only_the_target() {
        let tmp = tempfile::tempdir().expect("tmp dir");
        let a = write(tmp.path(), "a.py", WORKER_FILE);

        let tree =
            build_dependency_tree(&a, "Worker", EntityKind::Class, Some(0), None).expect("build");

        assert!(tree.upstream.is_empty());
        assert!(tree.downstream.is_empty());
        assert_eq!(tree.node_registry.len(), 1);
    }

    #[test]
    fn upstream_external_requires_both_reference_and_import() {
        let tmp = tempfile::tempdir().expect("tmp dir");
        write(tmp.path(), "lib.py", "def compute():\n    return 42\n");
        let main = write(
            tmp.path(),
            "main.py",
            "from lib import compute\n\n\ndef run():\n    return compute()\n",
        );
        // References compute without importing it: no external edge.
        let loose = write(
            tmp.path(),
            "loose.py",
            "def other():\n    return compute()\n",
        );

        let tree = build_dependency_tree(&main, "run", EntityKind::Function, None, Some(tmp.path()))
            .expect("build");
        let externals: Vec<&DependencyNode> = tree
            .upstream
            .iter()
            .filter(|n| n.dependency_kind == DependencyKind::ExternalReference)
            .collect();
        assert_eq!(externals.len(), 1);
        assert_eq!(externals[0].name, "compute");
        assert!(externals[0].file_path.ends_with("lib.py"));

        let tree = build_dependency_tree(&loose, "other", EntityKind::Function, None, Some(tmp.path()))
            .expect("build");
        assert!(tree
            .upstream
            .iter()
            .all(|n| n.dependency_kind != DependencyKind::ExternalReference));
    }

    #[test]
    fn dependency_path_lists_ancestors_in_order() {
        let tmp = tempfile::tempdir().expect("tmp dir");
        let tools = write(
            tmp.path(),
            "tools.py",
            "def low():\n    return 1\n\n\ndef mid():\n    return low()\n\n\ndef top():\n    return mid()\n",
        );

        let tree =
            build_dependency_tree(&tools, "top", EntityKind::Function, None, None).expect("build");

        let mid = tree.upstream.iter().find(|n| n.name == "mid").expect("mid");
        let low = tree.upstream.iter().find(|n| n.name == "low").expect("low");
        assert_eq!(mid.dependency_path, vec!["top"]);
        assert_eq!(mid.depth, -1);
        assert_eq!(low.dependency_path, vec!["top", "mid"]);
        assert_eq!(low.depth, -2);
    }

    #[test]
    fn mutual_recursion_terminates_and_keeps_first_registration() {
        let tmp = tempfile::tempdir().expect("tmp dir");
        let a = write(
            tmp.path(),
            "a.py",
            "def ping():\n    return pong()\n\n\ndef pong():\n    return ping()\n",
        );

        let tree =
            build_dependency_tree(&a, "ping", EntityKind::Function, None, None).expect("build");

        // ping -> pong -> ping stops at the repeated (name, file) pair;
        // the rediscovered ping is an event, not a re-registration.
        let names: Vec<&str> = tree.upstream.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["pong", "ping"]);
        assert_eq!(tree.upstream[1].depth, -2);
        assert_eq!(
            tree.node_registry[&tree.target.id()].dependency_kind,
            DependencyKind::Target
        );
        assert_eq!(tree.node_registry.len(), 2);
    }

    #[test]
    fn node_cap_truncates_without_error() {
        let tmp = tempfile::tempdir().expect("tmp dir");
        let hub = write(tmp.path(), "hub.py", "def hub():\n    return 0\n");
        for i in 0..5 {
            write(
                tmp.path(),
                &format!("caller{}.py", i),
                &format!("def caller{}():\n    return hub()\n", i),
            );
        }

        let tree = TreeBuilder::new()
            .with_max_nodes(3)
            .build(&hub, "hub", EntityKind::Function, None, Some(tmp.path()))
            .expect("build");

        assert_eq!(tree.node_registry.len(), 3);
        assert!(tree.truncated());
        assert_eq!(tree.downstream.len(), 2);
    }

    #[test]
    fn missing_target_reports_suggestion() {
        let tmp = tempfile::tempdir().expect("tmp dir");
        let a = write(tmp.path(), "a.py", WORKER_FILE);

        let err = build_dependency_tree(&a, "Wroker", EntityKind::Class, None, None)
            .expect_err("should not build");
        let message = format!("{}", err);
        assert!(message.contains("not found"));
        assert!(message.contains("did you mean 'Worker'"));
    }

    #[test]
    fn builder_is_reusable_across_sequential_builds() {
        let tmp = tempfile::tempdir().expect("tmp dir");
        let a = write(tmp.path(), "a.py", WORKER_FILE);

        let mut builder = TreeBuilder::new();
        let first = builder
            .build(&a, "Worker", EntityKind::Class, Some(1), None)
            .expect("first build");
        let second = builder
            .build(&a, "helper", EntityKind::Function, Some(1), None)
            .expect("second build");

        assert_eq!(first.target.name, "Worker");
        assert_eq!(second.target.name, "helper");
        assert_eq!(second.node_registry[&second.target.id()].depth, 0);
    }
}
