use std::path::PathBuf;

use crate::types::{ColorMode, EntityKind, OutputMode, ReportFormat};

#[derive(Debug)]
pub struct ParsedArgs {
    pub file_path: Option<PathBuf>,
    pub entity_name: Option<String>,
    pub entity_kind: Option<EntityKind>,
    pub max_depth: Option<usize>,
    pub codebase_root: Option<PathBuf>,
    pub format: ReportFormat,
    pub output: OutputMode,
    pub output_path: Option<PathBuf>,
    pub upstream_only: bool,
    pub downstream_only: bool,
    pub max_nodes: Option<usize>,
    pub color: ColorMode,
    pub verbose: bool,
    pub show_help: bool,
    pub show_version: bool,
}

impl Default for ParsedArgs {
    fn default() -> Self {
        Self {
            file_path: None,
            entity_name: None,
            entity_kind: None,
            max_depth: None,
            codebase_root: None,
            format: ReportFormat::Tree,
            output: OutputMode::Human,
            output_path: None,
            upstream_only: false,
            downstream_only: false,
            max_nodes: None,
            color: ColorMode::Auto,
            verbose: false,
            show_help: false,
            show_version: false,
        }
    }
}

fn parse_color_mode(raw: &str) -> Result<ColorMode, String> {
    match raw {
        "auto" => Ok(ColorMode::Auto),
        "always" => Ok(ColorMode::Always),
        "never" => Ok(ColorMode::Never),
        _ => Err("--color expects auto|always|never".to_string()),
    }
}

fn parse_format(raw: &str) -> Result<ReportFormat, String> {
    match raw {
        "tree" => Ok(ReportFormat::Tree),
        "list" => Ok(ReportFormat::List),
        "depths" => Ok(ReportFormat::Depths),
        "paths" => Ok(ReportFormat::Paths),
        "graph" => Ok(ReportFormat::Graph),
        _ => Err("--format expects tree|list|depths|paths|graph".to_string()),
    }
}

fn parse_usize(raw: &str, flag: &str) -> Result<usize, String> {
    raw.parse::<usize>()
        .map_err(|_| format!("{flag} requires a non-negative integer"))
}

fn parse_positive_usize(raw: &str, flag: &str) -> Result<usize, String> {
    let value = parse_usize(raw, flag)?;
    if value == 0 {
        Err(format!("{flag} requires a positive integer"))
    } else {
        Ok(value)
    }
}

pub fn parse_args() -> Result<ParsedArgs, String> {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    parse_arg_list(&raw)
}

pub fn parse_arg_list(raw: &[String]) -> Result<ParsedArgs, String> {
    let mut parsed = ParsedArgs::default();
    let mut positionals: Vec<String> = Vec::new();
    let mut iter = raw.iter();

    while let Some(arg) = iter.next() {
        let mut value_for = |flag: &str| -> Result<String, String> {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{flag} requires a value"))
        };

        match arg.as_str() {
            "-h" | "--help" => parsed.show_help = true,
            "--version" => parsed.show_version = true,
            "-d" | "--max-depth" => {
                parsed.max_depth = Some(parse_usize(&value_for("--max-depth")?, "--max-depth")?);
            }
            "-r" | "--root" => {
                parsed.codebase_root = Some(PathBuf::from(value_for("--root")?));
            }
            "-f" | "--format" => {
                parsed.format = parse_format(&value_for("--format")?)?;
            }
            "-o" | "--output" => {
                parsed.output_path = Some(PathBuf::from(value_for("--output")?));
            }
            "--json" => parsed.output = OutputMode::Json,
            "--upstream-only" => parsed.upstream_only = true,
            "--downstream-only" => parsed.downstream_only = true,
            "--max-nodes" => {
                parsed.max_nodes =
                    Some(parse_positive_usize(&value_for("--max-nodes")?, "--max-nodes")?);
            }
            "--color" => {
                parsed.color = parse_color_mode(&value_for("--color")?)?;
            }
            "--verbose" => parsed.verbose = true,
            other if other.starts_with("--color=") => {
                parsed.color = parse_color_mode(other.trim_start_matches("--color="))?;
            }
            other if other.starts_with('-') && other.len() > 1 => {
                return Err(format!("Unknown option: {other}"));
            }
            _ => positionals.push(arg.clone()),
        }
    }

    if parsed.show_help || parsed.show_version {
        return Ok(parsed);
    }

    let mut positionals = positionals.into_iter();
    parsed.file_path = positionals.next().map(PathBuf::from);
    parsed.entity_name = positionals.next();
    if let Some(raw_kind) = positionals.next() {
        parsed.entity_kind = Some(
            EntityKind::parse(&raw_kind)
                .ok_or_else(|| format!("Unknown entity kind '{raw_kind}' (expected: function|class)"))?,
        );
    }
    if let Some(extra) = positionals.next() {
        return Err(format!("Unexpected argument: {extra}"));
    }

    // Conflicting direction filters are a user error before any traversal.
    if parsed.upstream_only && parsed.downstream_only {
        return Err("Cannot combine --upstream-only and --downstream-only".to_string());
    }

    Ok(parsed)
}
