use std::panic;
use std::time::Instant;

use anyhow::{Context, Result, bail};

use reftree::args::{self, ParsedArgs};
use reftree::deptree::TreeBuilder;
use reftree::output::{self, RenderOptions};
use reftree::progress;
use reftree::types::OutputMode;

fn install_broken_pipe_handler() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let payload = info.payload();
        let is_broken = payload
            .downcast_ref::<&str>()
            .is_some_and(|s| s.contains("Broken pipe"))
            || payload
                .downcast_ref::<String>()
                .is_some_and(|s| s.contains("Broken pipe"));

        if is_broken {
            // Quietly exit when downstream closes the pipe (e.g. piping to `head`).
            std::process::exit(0);
        }

        default_hook(info);
    }));
}

fn format_usage() -> &'static str {
    "reftree - entity-level dependency trees for Python codebases\n\n\
Usage: reftree <file> <entity> <function|class> [options]\n\n\
Builds the bidirectional dependency tree for one top-level function or\n\
class: upstream (what it depends on) and downstream (what depends on it).\n\n\
Options:\n  \
  -d, --max-depth <n>       Limit traversal depth (0 = target only; default unlimited)\n  \
  -r, --root <dir>          Codebase root to scan (default: parent dir of <file>)\n  \
  -f, --format <name>       Output layout: tree|list|depths|paths|graph (default tree)\n  \
  -o, --output <file>       Write the report to a file instead of stdout\n  \
  --upstream-only           Show only what the target depends on\n  \
  --downstream-only         Show only what depends on the target\n  \
  --json                    Emit the full tree (registry included) as JSON\n  \
  --max-nodes <n>           Safety cap on registered nodes (default 10000)\n  \
  --color[=mode]            Colorize output: auto|always|never (default auto)\n  \
  --verbose                 Print scan statistics to stderr\n  \
  -h, --help                Show this message\n  \
  --version                 Show version\n\n\
Examples:\n  \
  reftree src/models.py Worker class                 # Full tree, both directions\n  \
  reftree src/models.py Worker class -d 2 --json     # Bounded, machine-readable\n  \
  reftree api.py handler function --downstream-only  # Who calls this?\n"
}

fn main() {
    install_broken_pipe_handler();

    let parsed = match args::parse_args() {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("{}", err);
            eprintln!("Try: reftree --help");
            std::process::exit(1);
        }
    };

    if parsed.show_help {
        println!("{}", format_usage());
        return;
    }
    if parsed.show_version {
        println!("reftree {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if let Err(err) = run(&parsed) {
        progress::error(&format!("{:#}", err));
        std::process::exit(1);
    }
}

fn run(parsed: &ParsedArgs) -> Result<()> {
    let (Some(file_path), Some(entity_name), Some(entity_kind)) = (
        parsed.file_path.as_ref(),
        parsed.entity_name.as_ref(),
        parsed.entity_kind,
    ) else {
        bail!("expected <file> <entity> <function|class> (see reftree --help)");
    };

    let spinner = match parsed.output {
        OutputMode::Human => Some(progress::Spinner::new(&format!(
            "Building dependency tree for {}...",
            entity_name
        ))),
        OutputMode::Json => None,
    };

    let started = Instant::now();
    let mut builder = TreeBuilder::new();
    if let Some(max_nodes) = parsed.max_nodes {
        builder = builder.with_max_nodes(max_nodes);
    }
    let result = builder.build(
        file_path,
        entity_name,
        entity_kind,
        parsed.max_depth,
        parsed.codebase_root.as_deref(),
    );
    if let Some(spinner) = &spinner {
        spinner.finish_clear();
    }
    let tree = result?;

    if parsed.verbose {
        eprintln!(
            "indexed {} files, registered {} nodes in {}",
            builder.files_indexed(),
            tree.node_registry.len(),
            progress::format_duration(started.elapsed())
        );
    }
    if tree.truncated() {
        progress::warning(&format!(
            "node cap reached ({}); results are truncated",
            tree.max_nodes
        ));
    }

    let report = match parsed.output {
        OutputMode::Json => output::render_json(&tree),
        OutputMode::Human => {
            let opts = RenderOptions {
                show_upstream: !parsed.downstream_only,
                show_downstream: !parsed.upstream_only,
                color: parsed.output_path.is_none() && output::resolve_color(parsed.color),
            };
            output::render(&tree, parsed.format, &opts)
        }
    };

    match &parsed.output_path {
        Some(path) => {
            std::fs::write(path, &report)
                .with_context(|| format!("failed to write {}", path.display()))?;
            progress::success(&format!("Dependency analysis saved to: {}", path.display()));
        }
        None => print!("{}", report),
    }

    Ok(())
}
