//! Stratum CLI - run a staged pipeline over a module file
//!
//! Project-based invocation: all configuration comes from a JSON project
//! file naming the input module and the pipeline settings.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process;
use stratum_pipeline::{
    CompilerContext, MarkerPass, NoOpPass, PipelineRegistry, RenameDialectPass, StripAttrPass,
};

mod config;
mod logging;

use config::{LogConfig, ProjectConfig};
use logging::LogFormat;

#[derive(Parser)]
#[command(
    name = "stratum",
    about = "Stratum staged pipeline engine - project-based execution",
    version = "0.1.0"
)]
struct Cli {
    /// Project file path (default: ./stratum.json)
    #[arg(value_name = "PROJECT", default_value = "stratum.json")]
    project: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let project = match read_project(&cli.project) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let log_config = LogConfig::from_section(&project.log);
    let format = project
        .log
        .format
        .as_deref()
        .and_then(LogFormat::from_name)
        .unwrap_or(LogFormat::Compact);
    logging::init(&log_config, format);

    let input_path = resolve_input_path(&cli.project, &project.input);
    let source = match std::fs::read_to_string(&input_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!(
                "Error: cannot read input file '{}': {}",
                input_path.display(),
                e
            );
            process::exit(1);
        }
    };

    let mut module = match stratum_ir::parse_module(&source) {
        Ok(module) => module,
        Err(e) => {
            eprintln!("Error: {}: {}", input_path.display(), e);
            process::exit(1);
        }
    };

    let context = match CompilerContext::new(default_registry(), project.settings) {
        Ok(context) => context,
        Err(e) => {
            eprintln!("Error: invalid pipeline description: {}", e);
            process::exit(1);
        }
    };

    match context.run(&mut module) {
        Ok(()) => println!("{}", module),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Read and parse the project file
fn read_project(path: &Path) -> Result<ProjectConfig, String> {
    if !path.exists() {
        return Err(format!(
            "'{}' not found\n\nThe current directory is not a Stratum project.\nHint: create '{}' with an 'input' field",
            path.display(),
            path.display()
        ));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;

    let project: ProjectConfig = serde_json::from_str(&content)
        .map_err(|e| format!("failed to parse '{}': {}", path.display(), e))?;

    if project.input.is_empty() {
        return Err(format!("'input' field in '{}' must not be empty", path.display()));
    }

    Ok(project)
}

/// Resolve input file path relative to the project file directory
fn resolve_input_path(project_path: &Path, input: &str) -> PathBuf {
    let base_dir = project_path.parent().unwrap_or(Path::new("."));
    base_dir.join(input)
}

/// The built-in demo pipeline.
///
/// Three stages: cleanup strips debug attributes, lowering rewrites the
/// `tile` dialect into `xegpu` and requests one detour back through
/// cleanup, finalize is a placeholder for emission. Exercises default
/// links and a backward jump edge.
fn default_registry() -> PipelineRegistry {
    let mut registry = PipelineRegistry::new();
    registry
        .register_stage(
            "cleanup",
            Vec::<String>::new(),
            vec![Box::new(StripAttrPass::new("debug")) as _],
        )
        .register_stage(
            "lowering",
            ["cleanup"],
            vec![
                Box::new(RenameDialectPass::new("tile", "xegpu")) as _,
                Box::new(MarkerPass::once("recleanup-request", "cleanup")) as _,
            ],
        )
        .register_stage(
            "finalize",
            Vec::<String>::new(),
            vec![Box::new(NoOpPass::new("emit")) as _],
        );
    registry
}
