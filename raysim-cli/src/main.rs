mod view_app;

use clap::{Parser, Subcommand};
use raysim_core::diagnostics::{format_diagnostic, format_parse_error, format_runtime_error};
use raysim_core::visual::render_ascii;
use raysim_core::{
    analyze_instrument, instruments, monitor_reports, parse_instrument, run_instrument_with,
    MonitorReport, RunOverrides, RuntimeError,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "raysim")]
#[command(about = "raysim - a toy neutron and optical ray tracer", long_about = None)]
struct Cli {
    /// Log component placement and run summaries
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an instrument file
    Run {
        /// Path to the instrument file
        file: PathBuf,
        /// Number of rays, overriding the file's run directive
        #[arg(long)]
        rays: Option<usize>,
        /// Random seed, overriding the file's run directive
        #[arg(long)]
        seed: Option<u64>,
        /// Trace rays on all cores
        #[arg(long)]
        parallel: bool,
    },
    /// Run a built-in instrument (guide or large)
    Example {
        name: String,
        #[arg(long, default_value_t = 1000)]
        rays: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Parse and analyze an instrument file without running it
    Check {
        file: PathBuf,
    },
    /// Open the interactive viewer
    View {
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let outcome = match cli.command {
        Commands::Run {
            file,
            rays,
            seed,
            parallel,
        } => run_file(
            &file,
            RunOverrides {
                rays,
                seed,
                parallel,
            },
        ),
        Commands::Example { name, rays, seed } => run_example(&name, rays, seed),
        Commands::Check { file } => check_file(&file),
        Commands::View { file } => view_file(file),
    };

    if let Err(message) = outcome {
        eprintln!("{}", message);
        std::process::exit(1);
    }
}

fn read_source(file: &Path) -> Result<String, String> {
    fs::read_to_string(file).map_err(|e| format!("Error: cannot read {}: {}", file.display(), e))
}

fn run_file(file: &Path, overrides: RunOverrides) -> Result<(), String> {
    let source = read_source(file)?;
    let result = run_instrument_with(&source, overrides).map_err(|e| describe(&e, &source))?;

    println!(
        "traced {} rays (seed {})",
        result.rays.len(),
        result.settings.seed
    );
    print_reports(&result.monitors);
    Ok(())
}

fn run_example(name: &str, rays: usize, seed: u64) -> Result<(), String> {
    let mut sim = instruments::by_name(name)
        .ok_or_else(|| {
            format!(
                "Error: unknown example '{}' (expected one of: {})",
                name,
                instruments::NAMES.join(", ")
            )
        })?
        .map_err(|e| format_runtime_error(&e))?;

    sim.set_seed(seed);
    let traced = sim.run(rays).map_err(|e| format_runtime_error(&e))?;
    println!("traced {} rays through '{}' (seed {})", traced.len(), name, seed);
    print_reports(&monitor_reports(&sim));
    Ok(())
}

fn check_file(file: &Path) -> Result<(), String> {
    let source = read_source(file)?;
    let instrument = parse_instrument(&source).map_err(|e| format_parse_error(&e, &source))?;
    let diagnostics = analyze_instrument(&instrument);

    for diagnostic in diagnostics.iter() {
        println!("{}", format_diagnostic(diagnostic, &source));
    }
    if diagnostics.has_errors() {
        return Err(format!(
            "{}: {} error(s)",
            file.display(),
            diagnostics.errors().count()
        ));
    }
    println!(
        "{}: {} components, no errors",
        file.display(),
        instrument.components.len()
    );
    Ok(())
}

fn view_file(file: PathBuf) -> Result<(), String> {
    let title = format!("raysim - {}", file.display());
    eframe::run_native(
        &title,
        eframe::NativeOptions::default(),
        Box::new(move |cc| Ok(Box::new(view_app::ViewApp::new(file, cc)))),
    )
    .map_err(|e| format!("Error: viewer failed: {}", e))
}

/// Error text with the offending source lines quoted
fn describe(error: &RuntimeError, source: &str) -> String {
    match error {
        RuntimeError::Parse(e) => format_parse_error(e, source),
        RuntimeError::Analysis(diagnostics) => diagnostics
            .iter()
            .map(|d| format_diagnostic(d, source))
            .collect::<Vec<_>>()
            .join("\n"),
        other => format_runtime_error(other),
    }
}

fn print_reports(reports: &[MonitorReport]) {
    for report in reports {
        let (nx, ny) = report.histogram.shape();
        println!();
        println!(
            "monitor '{}' ({} x {} m, {} x {} bins)",
            report.name, report.width, report.height, nx, ny
        );
        println!(
            "  counts: {}  intensity: {:.6}",
            report.histogram.total_counts(),
            report.histogram.total_intensity()
        );
        print!("{}", render_ascii(&report.histogram));
    }
}
