//! `tether-cli` – interactive sandbox for the carry and tether core.
//!
//! This binary:
//!
//! 1. Installs tracing via [`tether_runtime::init_tracing`].
//! 2. Loads `~/.tether/config.toml`, writing the defaults on first run.
//! 3. Builds a headless demo scene and drops the user into a REPL
//!    (`/look`, `/pickup`, `/throw`, `/recall`, `/run`, `/status`, ...).
//! 4. Intercepts **Ctrl-C** to stop any running simulation and exit cleanly.

mod config;
mod demo;
mod repl;

use colored::Colorize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

fn main() {
    // Console logging, plus OTLP export when OTEL_EXPORTER_OTLP_ENDPOINT is
    // set.  User-facing output still goes through println!.
    let _tracing = tether_runtime::init_tracing("tether-cli");

    print_banner();

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping the simulation …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; graceful shutdown on Ctrl-C will not be available");
    }

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => first_run(),
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };

    println!(
        "  Simulating at {} Hz.  Type {} for a list of commands.\n",
        cfg.tick_rate_hz.to_string().bold(),
        "/help".bold().cyan()
    );

    repl::run(cfg, shutdown);
}

// ─────────────────────────────────────────────────────────────────────────────
// First run
// ─────────────────────────────────────────────────────────────────────────────

fn first_run() -> config::Config {
    let mut cfg = config::Config::default();
    config::apply_env_overrides(&mut cfg);
    if let Err(e) = cfg.validate() {
        println!("{}: {}", "Environment overrides rejected".red(), e);
        cfg = config::Config::default();
    }

    println!("  No configuration found.  Writing defaults.");
    match config::save(&cfg) {
        Ok(()) => println!(
            "  {} Config saved to {}",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }
    cfg
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"  __       __  __          "#.bold().cyan());
    println!("{}", r#" / /____  / /_/ /  ___ ____"#.bold().cyan());
    println!("{}", r#"/ __/ -_)/ __/ _ \/ -_) __/"#.bold().cyan());
    println!("{}", r#"\__/\__/ \__/_//_/\__/_/   "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "tether".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Carry, throw and recall sandbox");
    println!();
}
