//! REPL – Read-Eval-Print Loop for the tether sandbox.
//!
//! Supported slash-commands:
//!   /look <yaw> <pitch>  – aim the camera (degrees)
//!   /move <x> <y> <z>    – move the camera
//!   /pickup /drop        – carry actions
//!   /draw /release       – press / release the secondary action
//!   /throw /recall       – tether actions
//!   /tick [n]            – advance n ticks (default 1)
//!   /run <seconds>       – advance by wall-clock seconds of simulation
//!   /status              – objects, holders and tether phases
//!   /events              – drain the interaction journal
//!   /settings            – show the active configuration
//!   /help                – show this list
//!   /quit | /exit        – gracefully exit the CLI

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tether_runtime::object::CarriableObject;
use tether_spatial::transform::{Quaternion, Vec3};
use tether_spatial::viewpoint::SharedViewpoint;
use tether_types::{CarrierId, InputEvent, ObjectId, TetherError};

use crate::config::{self, Config};
use crate::demo::{self, SandboxSession};

/// A parsed slash-command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Help,
    Quit,
    Look { yaw: f32, pitch: f32 },
    Move(Vec3),
    Input(InputEvent),
    Tick(u32),
    Run(f32),
    Status,
    Events,
    Settings,
}

/// Parse one input line.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Err("empty command".to_string());
    };
    let args: Vec<&str> = parts.collect();

    let cmd = match head {
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        "/look" => {
            let [yaw, pitch] = floats::<2>(&args)?;
            Command::Look { yaw, pitch }
        }
        "/move" => {
            let [x, y, z] = floats::<3>(&args)?;
            Command::Move(Vec3::new(x, y, z))
        }
        "/pickup" => Command::Input(InputEvent::PickupPressed),
        "/drop" => Command::Input(InputEvent::DropPressed),
        "/draw" => Command::Input(InputEvent::SecondaryPressed),
        "/release" => Command::Input(InputEvent::SecondaryReleased),
        "/throw" => Command::Input(InputEvent::ThrowPressed),
        "/recall" => Command::Input(InputEvent::RecallPressed),
        "/tick" => match args.as_slice() {
            [] => Command::Tick(1),
            [n] => Command::Tick(n.parse().map_err(|_| format!("not a tick count: {n}"))?),
            _ => return Err("usage: /tick [n]".to_string()),
        },
        "/run" => {
            let [seconds] = floats::<1>(&args)?;
            if seconds < 0.0 {
                return Err("seconds must be non-negative".to_string());
            }
            Command::Run(seconds)
        }
        "/status" => Command::Status,
        "/events" => Command::Events,
        "/settings" => Command::Settings,
        other => return Err(format!("unknown command '{other}'")),
    };
    Ok(cmd)
}

fn floats<const N: usize>(args: &[&str]) -> Result<[f32; N], String> {
    if args.len() != N {
        return Err(format!("expected {N} number(s), got {}", args.len()));
    }
    let mut out = [0.0; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = arg
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("not a number: {arg}"))?;
    }
    Ok(out)
}

// ─────────────────────────────────────────────────────────────────────────────
// Sandbox
// ─────────────────────────────────────────────────────────────────────────────

/// The demo session plus the camera the REPL steers.
pub struct Sandbox {
    cfg: Config,
    session: SandboxSession,
    camera: SharedViewpoint,
    player: CarrierId,
}

impl Sandbox {
    pub fn new(cfg: Config) -> Result<Self, TetherError> {
        let (session, camera) = demo::build(&cfg)?;
        let player = session.primary_carrier();
        Ok(Self {
            cfg,
            session,
            camera,
            player,
        })
    }

    /// Run one command.  Returns `false` when the REPL should exit.
    pub fn execute(&mut self, cmd: Command, shutdown: &AtomicBool) -> Result<bool, TetherError> {
        match cmd {
            Command::Help => cmd_help(),
            Command::Quit => return Ok(false),
            Command::Look { yaw, pitch } => {
                self.camera
                    .set_rotation(Quaternion::from_euler_degrees(pitch, yaw, 0.0));
                println!("  Looking at yaw {yaw:.1}°, pitch {pitch:.1}°");
            }
            Command::Move(position) => {
                self.camera.set_position(position);
                println!("  Camera at {}", fmt_vec(position));
            }
            Command::Input(event) => {
                let applied = self.session.apply(self.player, event)?;
                if applied {
                    println!("  {} {:?}", "✓".green(), event);
                } else {
                    println!("  {} {:?} had no effect", "·".dimmed(), event);
                }
            }
            Command::Tick(n) => {
                let ran = self.advance(n, shutdown)?;
                println!("  Advanced {ran} tick(s) → tick {}", self.session.tick_count());
            }
            Command::Run(seconds) => {
                let n = (seconds * self.cfg.tick_rate_hz as f32).ceil() as u32;
                let ran = self.advance(n, shutdown)?;
                println!(
                    "  Ran {:.2}s ({ran} tick(s)) → tick {}",
                    ran as f32 * self.cfg.dt(),
                    self.session.tick_count()
                );
            }
            Command::Status => self.print_status(),
            Command::Events => self.print_events(),
            Command::Settings => print_settings(&self.cfg),
        }
        Ok(true)
    }

    /// Advance up to `n` ticks, stopping early on shutdown.
    fn advance(&mut self, n: u32, shutdown: &AtomicBool) -> Result<u32, TetherError> {
        let dt = self.cfg.dt();
        for i in 0..n {
            if shutdown.load(Ordering::SeqCst) {
                return Ok(i);
            }
            self.session.tick(dt)?;
        }
        Ok(n)
    }

    fn name_of(&self, id: Option<ObjectId>) -> String {
        id.and_then(|id| self.session.object(id))
            .map(|o| o.name().to_string())
            .unwrap_or_else(|| "–".to_string())
    }

    fn print_status(&self) {
        let view = self.camera.pose();
        println!();
        println!("{}", "Sandbox Status".bold().underline());
        println!(
            "  Tick {}  camera {}  facing {}",
            self.session.tick_count(),
            fmt_vec(view.position),
            fmt_vec(view.forward())
        );
        if let Some(controller) = self.session.controller(self.player) {
            println!(
                "  Holding: {}   Last thrown: {}",
                self.name_of(controller.held()).bold(),
                self.name_of(controller.last_thrown())
            );
        }

        let mut objects: Vec<(ObjectId, &CarriableObject)> = self.session.scene().iter().collect();
        objects.sort_by(|a, b| a.1.name().cmp(b.1.name()));
        for (_, obj) in objects {
            let mode = if obj.is_kinematic() {
                "kinematic".yellow()
            } else {
                "simulated".green()
            };
            let phase = obj
                .tether()
                .map(|t| format!("  tether: {}", t.phase()))
                .unwrap_or_default();
            let held = if obj.holder().is_some() { "  (held)" } else { "" };
            println!(
                "    {:<8} {}  {}{}{}",
                obj.name().bold(),
                fmt_vec(obj.pose.position),
                mode,
                held.cyan(),
                phase
            );
        }
        println!();
    }

    fn print_events(&mut self) {
        let events = self.session.drain_events();
        if events.is_empty() {
            println!("  {}", "No new events.".dimmed());
            return;
        }
        for event in events {
            let payload = serde_json::to_string(&event.payload)
                .unwrap_or_else(|e| format!("<unserialisable: {e}>"));
            println!("  [{:>5}] {} {}", event.tick, event.source.dimmed(), payload);
        }
    }
}

/// Entry point for the interactive REPL.
///
/// `shutdown` is polled each iteration; when set the REPL exits cleanly.
pub fn run(cfg: Config, shutdown: Arc<AtomicBool>) {
    let mut sandbox = match Sandbox::new(cfg) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}: {}", "Failed to build the sandbox".red(), e);
            return;
        }
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", "tether>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let cmd = match parse_command(line) {
            Ok(cmd) => cmd,
            Err(e) => {
                println!("{} {}. Type {} for available commands.", "Error:".red(), e, "/help".bold());
                continue;
            }
        };

        match sandbox.execute(cmd, &shutdown) {
            Ok(true) => {}
            Ok(false) => {
                println!("{}", "Goodbye.".green());
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
            Err(e) => println!("{}: {}", "Session error".red(), e),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "Tether Sandbox Commands".bold().underline());
    println!("  {}   – aim the camera in degrees", "/look <yaw> <pitch>".bold().cyan());
    println!("  {}   – move the camera", "/move <x> <y> <z>".bold().cyan());
    println!("  {}         – pick up / drop what you look at", "/pickup /drop".bold().cyan());
    println!("  {}       – press / release the draw-back", "/draw /release".bold().cyan());
    println!("  {}       – throw / recall the tethered object", "/throw /recall".bold().cyan());
    println!("  {}   – advance ticks", "/tick [n]  /run <s>".bold().cyan());
    println!("  {}       – show objects / drain the journal", "/status /events".bold().cyan());
    println!("  {}             – show the active configuration", "/settings".bold().cyan());
    println!("  {}          – exit the CLI", "/quit  /exit".bold().cyan());
    println!();
}

fn print_settings(cfg: &Config) {
    println!("{}", "Active Settings".bold().underline());
    println!("  Loaded from {}", config::config_path().display().to_string().dimmed());
    match toml::to_string_pretty(cfg) {
        Ok(raw) => {
            for line in raw.lines() {
                println!("    {line}");
            }
        }
        Err(e) => println!("{}: {}", "Error rendering config".red(), e),
    }
}

fn fmt_vec(v: Vec3) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
}
