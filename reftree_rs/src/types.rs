use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Default limit on registered nodes per build. Downstream fan-out can
/// explode on codebases with hot common names; the cap bounds it.
pub const DEFAULT_NODE_CAP: usize = 10_000;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OutputMode {
    Human,
    Json,
}

/// Traversal direction selector for projections and CLI filters.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Upstream,
    Downstream,
}

/// Human output layout for the CLI.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ReportFormat {
    Tree,
    List,
    Depths,
    Paths,
    Graph,
}

/// Kind of a top-level Python entity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Function,
    Class,
}

impl EntityKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "function" => Some(EntityKind::Function),
            "class" => Some(EntityKind::Class),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Function => "function",
            EntityKind::Class => "class",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A top-level function or class extracted from one source file.
///
/// Spans are 1-based and inclusive; a decorated definition starts at its
/// first decorator line. Immutable once parsed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CodeEntity {
    pub name: String,
    pub kind: EntityKind,
    pub file_path: String,
    pub line_start: usize,
    pub line_end: usize,
    pub source_text: String,
}

/// How a discovered node relates to the entity that discovered it.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    Target,
    InternalReference,
    ExternalReference,
    Inheritance,
    Import,
    FunctionCall,
    Instantiation,
    AttributeAccess,
    NameReference,
    UnknownReference,
}

impl DependencyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::Target => "target",
            DependencyKind::InternalReference => "internal_reference",
            DependencyKind::ExternalReference => "external_reference",
            DependencyKind::Inheritance => "inheritance",
            DependencyKind::Import => "import",
            DependencyKind::FunctionCall => "function_call",
            DependencyKind::Instantiation => "instantiation",
            DependencyKind::AttributeAccess => "attribute_access",
            DependencyKind::NameReference => "name_reference",
            DependencyKind::UnknownReference => "unknown_reference",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable node identity: `(name, file_path, line_start)`, rendered as
/// `name@path:line`. Two discoveries of the same identity are the same
/// logical entity even when reached via different paths.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(name: &str, file_path: &str, line_start: usize) -> Self {
        NodeId(format!("{}@{}:{}", name, file_path, line_start))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One node in a traversal result.
///
/// `depth` is signed: 0 is the target, negative depths are upstream
/// (dependencies), positive depths are downstream (dependents).
/// `dependency_path` holds the ancestor names from the tree root to this
/// node, excluding the node's own name.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DependencyNode {
    pub name: String,
    pub kind: EntityKind,
    pub file_path: String,
    pub line_start: usize,
    pub line_end: usize,
    pub dependency_kind: DependencyKind,
    pub depth: i32,
    pub parent: Option<NodeId>,
    pub root: NodeId,
    pub dependency_path: Vec<String>,
    pub children: Vec<NodeId>,
}

impl DependencyNode {
    pub fn id(&self) -> NodeId {
        NodeId::new(&self.name, &self.file_path, self.line_start)
    }

    pub fn location(&self) -> String {
        format!("{}:{}", self.file_path, self.line_start)
    }
}

/// The result of one `build` call.
///
/// `upstream`/`downstream` are flat discovery-event lists in depth-first
/// order: a shared dependency reached via two distinct paths appears once
/// per path, each event carrying its own `parent`/`dependency_path`. The
/// registry keeps exactly one canonical node per identity (first
/// registration wins).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DependencyTree {
    pub target: DependencyNode,
    pub upstream: Vec<DependencyNode>,
    pub downstream: Vec<DependencyNode>,
    pub node_registry: HashMap<NodeId, DependencyNode>,
    /// Node cap the build ran with; `node_registry.len() >= max_nodes`
    /// means the traversal was truncated.
    pub max_nodes: usize,
}

impl DependencyTree {
    pub fn truncated(&self) -> bool {
        self.node_registry.len() >= self.max_nodes
    }
}

/// A single import statement with its metadata.
///
/// `names` is empty for `import module` and holds the imported symbols for
/// `from module import a, b`. `level` counts leading dots of a relative
/// import.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStatement {
    pub module: String,
    pub names: Vec<String>,
    pub alias: Option<String>,
    pub level: usize,
    pub original_line: String,
    pub line: usize,
}

/// Syntactic role of a used name inside an entity body.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameContext {
    FunctionCall,
    ModuleReference,
    AttributeAccess,
    NameReference,
}

/// A name used in code that might need an import.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UsedName {
    pub name: String,
    pub context: NameContext,
    pub line: usize,
}
