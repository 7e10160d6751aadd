// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use student_acid::{run_scenario, WalkthroughConfig, SCENARIOS};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let mode = args.get(1).map(String::as_str).unwrap_or("acid");
    let extra = args.get(2).map(PathBuf::from);

    match mode {
        "records" => run_records_mode(extra)?,
        "scenarios" => {
            let mut config = load_config(extra.as_deref())?;
            if extra.is_none() {
                // Keep the scripted runs away from the interactive database
                config.database_path = env::temp_dir().join("student_acid_scenarios.db");
            }
            run_scenarios(config)?
        }
        "acid" => run_acid_mode(load_config(extra.as_deref())?)?,
        other => {
            eprintln!("❌ Unknown mode: {}", other);
            eprintln!("   Usage: student-acid [acid|records|scenarios] [config.json | students.csv]");
            std::process::exit(2);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<WalkthroughConfig> {
    match path {
        Some(path) => WalkthroughConfig::load_from_file(path),
        None => Ok(WalkthroughConfig::default()),
    }
}

/// Diagnostics go to stderr, or to a file when a TUI owns the terminal
fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("student_acid=info"));

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file: {:?}", path))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

fn run_scenarios(config: WalkthroughConfig) -> Result<()> {
    init_tracing(config.log_file.as_deref())?;

    println!("💾 ACID walkthrough - scripted scenarios");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut passed = 0;
    for scenario in &SCENARIOS {
        println!("\n▶ {}", scenario.name);

        let report = run_scenario(scenario, config.clone())
            .with_context(|| format!("Scenario '{}' could not run", scenario.name))?;

        for entry in &report.log {
            println!("  {}", entry);
        }

        let (source, destination) = report.expected;
        if report.passed() {
            passed += 1;
            println!("✓ {}={}, {}={}", config.source, source, config.destination, destination);
        } else {
            println!(
                "✗ expected {}={}, {}={}, got {:?}",
                config.source, source, config.destination, destination, report.actual
            );
        }
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ {}/{} scenarios behaved as expected", passed, SCENARIOS.len());

    if passed != SCENARIOS.len() {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(feature = "tui")]
fn run_acid_mode(config: WalkthroughConfig) -> Result<()> {
    if let Some(path) = config.log_file.as_deref() {
        init_tracing(Some(path))?;
    }

    println!("🖥️  Loading ACID walkthrough...\n");
    let session = student_acid::Session::open(config).context("Failed to initialize database")?;

    let mut app = ui::walkthrough::App::new(session);
    ui::run(|terminal| ui::walkthrough::run_app(terminal, &mut app))?;

    println!("\n✅ UI closed successfully");
    Ok(())
}

#[cfg(feature = "tui")]
fn run_records_mode(csv_path: Option<PathBuf>) -> Result<()> {
    let mut store = student_acid::RecordStore::new();

    if let Some(path) = csv_path.as_deref().filter(|p| p.exists()) {
        let summary = store
            .load_csv(path)
            .with_context(|| format!("Failed to import students from {:?}", path))?;
        println!("✓ Loaded {} students ({} rows skipped)", summary.added, summary.rejected);
    }

    let mut app = ui::records::App::new(store, csv_path);
    ui::run(|terminal| ui::records::run_app(terminal, &mut app))?;

    println!("\n✅ UI closed successfully");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_acid_mode(_config: WalkthroughConfig) -> Result<()> {
    tui_unavailable()
}

#[cfg(not(feature = "tui"))]
fn run_records_mode(_csv_path: Option<PathBuf>) -> Result<()> {
    tui_unavailable()
}

#[cfg(not(feature = "tui"))]
fn tui_unavailable() -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or run the headless walkthrough: cargo run -- scenarios");
    std::process::exit(1);
}
