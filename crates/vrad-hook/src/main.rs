use std::process::ExitCode;

use clap::builder::{styling::AnsiColor, Styles};
use clap::ColorChoice;
use clap::{CommandFactory, FromArgMatches, Parser};

use args::{decide_mode, CompilerArgs, LightingMode};
use compiler::Platform;
use config::{HookConfig, HookPaths};
use errors::HookError;

mod args;
mod compiler;
mod config;
mod errors;
mod logging;
mod screenshot;

/// Stands in for VRAD. Picks lighting settings for editor maps, runs the
/// real compiler, then packs custom content into the map.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The compiler's usual arguments. The last one is the map.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, num_args = 0..)]
    compiler_args: Vec<String>,
}

fn parse_args() -> Args {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Blue.on_default());

    let matches = Args::command()
        .styles(styles)
        .color(ColorChoice::Auto)
        .get_matches();

    Args::from_arg_matches(&matches).unwrap_or_else(|err| err.exit())
}

fn run(argv: &[String], paths: &HookPaths) -> Result<(), HookError> {
    tracing::info!("BEE2 VRAD hook started!");

    let args = CompilerArgs::parse(argv)?;
    tracing::info!("Map path is {}", args.map_path);

    let config = HookConfig::load(&paths.config_file());
    let mode = decide_mode(&args, &config);

    if let Err(err) = screenshot::update_screenshots(&config, paths) {
        tracing::warn!("Failed to update screenshots: {}", err);
    }

    match mode {
        LightingMode::Cheap => tracing::info!("Forcing Cheap Lighting!"),
        LightingMode::Faithful => {
            tracing::info!("Hammer map detected! Not forcing cheap lighting..")
        }
    }
    compiler::run_compiler(&paths.compiler(Platform::current()), args.for_mode(mode))?;

    if args.no_pack {
        tracing::warn!("No items to pack!");
    } else {
        bee_pack::pack_map(&paths.pack_context(&config, mode), &args.map_path)?;
    }

    tracing::info!("BEE2 VRAD hook finished!");
    Ok(())
}

fn main() -> ExitCode {
    let args = parse_args();

    let paths = match HookPaths::from_current_dir() {
        Ok(paths) => paths,
        Err(err) => {
            eprintln!("{:?}", miette::Report::new(err));
            return ExitCode::FAILURE;
        }
    };
    let log_guard = logging::init_logging(&paths.bee2_dir());

    let result = run(&args.compiler_args, &paths);
    if let Err(err) = &result {
        tracing::error!("{}", err);
    }
    // Flush the log file before any early exit below.
    drop(log_guard);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(HookError::CompilerFailed { code }) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::FAILURE
        }
    }
}
