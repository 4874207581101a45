//==================================================
// File: main.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: s4pd command line driver
// Objective: Run scripts and Pd-style message streams against a simulated
//            host with a virtual clock
//==================================================

use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use tracing::{info, warn};

use s4pd::{Atom, Bridge, Config, SimHost};

#[derive(Parser, Debug)]
#[command(name = "s4pd", about = "Scheme for Pd bridge driver")]
pub struct Args {
    /// Configuration file (defaults to the user config directory).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Raise log verbosity; repeat for more.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate a script, then run its delays on the virtual clock.
    Run(RunArgs),
    /// Feed one message per line to a bridge.
    Patch(PatchArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Scheme source file.
    pub script: PathBuf,

    /// Stop firing delays past this many virtual milliseconds.
    #[arg(long, default_value_t = 60_000.0)]
    pub until: f64,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PatchArgs {
    /// Message file; standard input when absent.
    pub input: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    s4pd::logging::init(args.verbose);
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Run(cmd) => run_script(config, &cmd),
        Command::Patch(cmd) => run_patch(config, &cmd),
    }
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("configuration file {} does not exist", path.display());
            }
            Config::load(path)
        }
        None => match Config::default_path() {
            Some(path) => Config::load(&path),
            None => Ok(Config::default()),
        },
    }
}

//==================================================
// Section 1.0 - run
//==================================================

fn run_script(config: Config, args: &RunArgs) -> Result<()> {
    let host = SimHost::from_config(&config.host);
    if let Some(parent) = args.script.parent() {
        host.add_search_path(parent);
    }
    let mut bridge = Bridge::new(host.clone(), config.bridge)?;
    let source = fs::read_to_string(&args.script)
        .with_context(|| format!("reading script {}", args.script.display()))?;

    let outcome = bridge.eval_string(&source).map_err(|err| anyhow!("{err}"));
    let fired = bridge.run_until_idle(args.until);
    info!(fired, now = host.now(), "virtual clock stopped");
    print_events(&host)?;
    outcome.map(|_| ())
}

//==================================================
// Section 2.0 - patch
//==================================================

fn run_patch(config: Config, args: &PatchArgs) -> Result<()> {
    let host = SimHost::from_config(&config.host);
    let mut bridge = Bridge::new(host.clone(), config.bridge)?;
    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => {
            let file = fs::File::open(path)
                .with_context(|| format!("opening {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(io::stdin())),
    };

    for (number, line) in reader.lines().enumerate() {
        let line = line.context("reading message")?;
        let line = line.trim().trim_end_matches(';').trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(directive) = line.strip_prefix('!') {
            run_directive(&mut bridge, &host, directive)
                .with_context(|| format!("line {}", number + 1))?;
            continue;
        }
        let atoms = Atom::parse_line(line);
        let _ = match atoms.split_first() {
            Some((Atom::Symbol(selector), rest)) => bridge.handle_message(selector, rest),
            _ => bridge.handle_message("list", &atoms),
        };
    }
    print_events(&host)
}

fn run_directive(bridge: &mut Bridge<SimHost>, host: &SimHost, directive: &str) -> Result<()> {
    let words: Vec<&str> = directive.split_whitespace().collect();
    match words.as_slice() {
        ["advance", ms] => {
            let ms: f64 = ms.parse().with_context(|| format!("bad duration '{ms}'"))?;
            bridge.advance(ms);
        }
        ["table", name, len] => {
            let len: usize = len.parse().with_context(|| format!("bad length '{len}'"))?;
            host.add_table(name, len);
        }
        ["receiver", name] => host.add_receiver(name),
        ["events"] => print_events(host)?,
        _ => warn!(directive, "unknown directive"),
    }
    Ok(())
}

fn print_events(host: &SimHost) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for event in host.take_events() {
        writeln!(out, "{event}")?;
    }
    Ok(())
}

//==================================================
// End of file
//==================================================
