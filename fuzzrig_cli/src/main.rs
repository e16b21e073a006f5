use fuzzrig_core::{BuildManifest, ResolveRequest, TargetConfig};

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Path to the target manifest (defaults to ./targets.toml).
    #[clap(short, long, value_parser)]
    manifest: Option<PathBuf>,
    #[clap(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Resolve a target's paths and commands and print them.
    Resolve {
        #[clap(short, long)]
        target: String,
        #[clap(short, long, default_value = ".")]
        basedir: PathBuf,
        /// Parallel task index; omit for a solo resolution.
        #[clap(long)]
        task_idx: Option<u32>,
        /// Explicit workdir override, used verbatim.
        #[clap(long)]
        workdir: Option<PathBuf>,
        #[clap(long)]
        json: bool,
    },
    /// Validate a generated fuzz driver against a resolved target.
    Validate {
        #[clap(short, long)]
        target: String,
        #[clap(short, long, default_value = ".")]
        basedir: PathBuf,
        #[clap(long)]
        task_idx: Option<u32>,
        /// File holding the candidate driver source.
        #[clap(short, long)]
        driver: PathBuf,
        /// Only write the driver into the workdir, skip the compile/syntax
        /// check.
        #[clap(long)]
        skip_check: bool,
    },
}

fn load_manifest(cli_path: Option<PathBuf>) -> Result<BuildManifest, anyhow::Error> {
    match cli_path {
        Some(path) => {
            println!("Loading manifest from specified path: {path:?}");
            BuildManifest::load_from_file(&path)
        }
        None => {
            let default_path = PathBuf::from("targets.toml");
            if default_path.exists() {
                println!("No manifest specified via CLI, loading default: {default_path:?}");
                BuildManifest::load_from_file(&default_path)
            } else {
                anyhow::bail!(
                    "no manifest specified and default 'targets.toml' not found in the current directory"
                )
            }
        }
    }
}

fn resolve_target(
    manifest: &BuildManifest,
    basedir: PathBuf,
    target: String,
    task_idx: Option<u32>,
    workdir: Option<PathBuf>,
) -> Result<TargetConfig, anyhow::Error> {
    let mut request = ResolveRequest::from_manifest(basedir, manifest, target);
    request.task_idx = task_idx;
    request.workdir = workdir;
    Ok(TargetConfig::resolve(request)?)
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let manifest = load_manifest(cli.manifest)?;

    match cli.command {
        CliCommand::Resolve {
            target,
            basedir,
            task_idx,
            workdir,
            json,
        } => {
            let config = resolve_target(&manifest, basedir, target, task_idx, workdir)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("target:     {}", config.target);
                println!("language:   {}", config.language.as_str());
                println!("workdir:    {}", config.workdir.display());
                println!("cachedir:   {}", config.cachedir.display());
                println!("driver:     {}", config.paths.driver_source.display());
                println!("seeds:      {}", config.paths.seed_dir.display());
                println!("artifacts:  {}", config.paths.artifact_dir.display());
                println!("build:      {}", config.build_cmd);
                if let Some(cpp_cmd) = &config.build_cmd_cpp {
                    println!("build_cpp:  {cpp_cmd}");
                }
                println!("test build: {}", config.test_build_cmd);
                println!("run:        {}", config.run_cmd);
            }
        }
        CliCommand::Validate {
            target,
            basedir,
            task_idx,
            driver,
            skip_check,
        } => {
            let config = resolve_target(&manifest, basedir, target, task_idx, None)?;
            let driver_text = std::fs::read_to_string(&driver)
                .map_err(|e| anyhow::anyhow!("Failed to read driver file {:?}: {}", driver, e))?;

            let outcome = config.validate_driver(&driver_text, !skip_check)?;
            if outcome.is_accepted() {
                println!(
                    "driver accepted, written to {}",
                    config.paths.driver_source.display()
                );
            } else {
                println!("driver rejected: {}", outcome.diagnostic());
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
