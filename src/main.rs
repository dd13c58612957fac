//! vtterm - replay terminal output through a VT100 interpreter
//!
//! Reads captured terminal output (a file or stdin), interprets it into an
//! in-memory text grid and prints the result with colors.
//!
//! # Quick Start
//!
//! ```text
//! vtterm session.log            # Replay a capture
//! some-cmd | vtterm             # Interpret piped output
//! vtterm -x firmware.bin        # Hex dump instead of interpreting
//! vtterm -k $'ls\r' --send crlf # Show the bytes a keystroke sequence sends
//! ```

use std::env;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::thread;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use vtterm::config::{ColorScheme, Config as VttermConfig, NewlineMode};
use vtterm::ui::{DebugRenderer, Renderer};
use vtterm::{GridSink, Session};

/// Command line options
#[derive(Default)]
struct Config {
    /// Capture file; stdin when absent
    input: Option<PathBuf>,
    /// Explicit config file
    config_path: Option<PathBuf>,
    width: Option<usize>,
    tab_size: Option<usize>,
    recv: Option<NewlineMode>,
    send: Option<NewlineMode>,
    hex: bool,
    echo: bool,
    keys: Option<String>,
    color_scheme: Option<String>,
    debug_dump: bool,
    verbose: bool,
}

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    eprintln!("vtterm {}", VERSION);
}

fn print_help() {
    eprintln!("vtterm {} - VT100 escape sequence interpreter", VERSION);
    eprintln!();
    eprintln!("Usage: vtterm [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Reads FILE (or stdin), interprets it and prints the resulting screen.");
    eprintln!();
    eprintln!("Terminal options:");
    eprintln!("  -w, --width <N>       Terminal width in columns (default 80)");
    eprintln!("  -t, --tab-size <N>    Tab stop interval (default 8)");
    eprintln!("      --recv <MODE>     Inbound line ending: cr, lf, crlf (default crlf)");
    eprintln!("      --send <MODE>     What Return sends: cr, lf, crlf (default cr)");
    eprintln!("  -x, --hex             Hex dump instead of interpreting");
    eprintln!("  -e, --echo            Echo typed keys (-k) to the screen");
    eprintln!("  -k, --keys <TEXT>     Type TEXT and print the encoded bytes to stderr");
    eprintln!();
    eprintln!("Display options:");
    eprintln!("      --scheme <NAME>   Color scheme");
    eprintln!("  -d, --debug           Plain dump with cursor marker instead of colors");
    eprintln!();
    eprintln!("Other options:");
    eprintln!("  -c, --config <FILE>   Config file (default ~/.vtterm/config.toml)");
    eprintln!("      --verbose         Debug logging to stderr (or set RUST_LOG)");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Color schemes: {}", ColorScheme::list().join(", "));
}

fn parse_args() -> Result<Config, String> {
    let args: Vec<String> = env::args().collect();
    let mut config = Config::default();
    let mut i = 1;

    fn value<'a>(args: &'a [String], i: &mut usize, flag: &str) -> Result<&'a str, String> {
        *i += 1;
        args.get(*i)
            .map(String::as_str)
            .ok_or_else(|| format!("Missing argument for {}", flag))
    }

    fn number(s: &str, flag: &str) -> Result<usize, String> {
        s.parse()
            .map_err(|_| format!("Invalid number for {}: {}", flag, s))
    }

    fn mode(s: &str, flag: &str) -> Result<NewlineMode, String> {
        NewlineMode::parse(s).ok_or_else(|| format!("Invalid mode for {}: {} (cr, lf, crlf)", flag, s))
    }

    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-w" | "--width" => config.width = Some(number(value(&args, &mut i, arg)?, arg)?),
            "-t" | "--tab-size" => config.tab_size = Some(number(value(&args, &mut i, arg)?, arg)?),
            "--recv" => config.recv = Some(mode(value(&args, &mut i, arg)?, arg)?),
            "--send" => config.send = Some(mode(value(&args, &mut i, arg)?, arg)?),
            "-x" | "--hex" => config.hex = true,
            "-e" | "--echo" => config.echo = true,
            "-k" | "--keys" => config.keys = Some(value(&args, &mut i, arg)?.to_string()),
            "--scheme" => config.color_scheme = Some(value(&args, &mut i, arg)?.to_string()),
            "-d" | "--debug" => config.debug_dump = true,
            "-c" | "--config" => config.config_path = Some(PathBuf::from(value(&args, &mut i, arg)?)),
            "--verbose" => config.verbose = true,
            "-" => config.input = None,
            other if other.starts_with('-') => {
                return Err(format!("Unknown argument: {}. Use -h for help.", other));
            }
            path => config.input = Some(PathBuf::from(path)),
        }
        i += 1;
    }

    Ok(config)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn main() -> anyhow::Result<()> {
    let config = match parse_args() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    init_logging(config.verbose);
    info!("vtterm starting...");

    let file_config = match &config.config_path {
        Some(path) => VttermConfig::load_from(path)?,
        None => VttermConfig::load(),
    };

    let mut settings = file_config.terminal.clone();
    if let Some(width) = config.width {
        settings.terminal_width = width;
    }
    if let Some(tab_size) = config.tab_size {
        settings.tab_size = tab_size;
    }
    if let Some(recv) = config.recv {
        settings.newline_recv = recv;
    }
    if let Some(send) = config.send {
        settings.newline_send = send;
    }
    settings.hex_output |= config.hex;
    settings.local_echo |= config.echo;

    let scheme = match &config.color_scheme {
        Some(name) => ColorScheme::by_name(name),
        None => file_config.get_color_scheme(),
    };

    let mut session = Session::new(GridSink::new(), settings)?;
    info!(
        "Terminal width: {}, recv: {:?}, send: {:?}, hex: {}",
        session.settings().terminal_width,
        session.settings().newline_recv,
        session.settings().newline_send,
        session.settings().hex_output
    );

    if let Some(keys) = &config.keys {
        let accepted = session.input(keys);
        let bytes = session.take_input(true);
        eprintln!(
            "Accepted {} of {} characters: {}",
            accepted,
            keys.chars().count(),
            bytes.escape_ascii()
        );
    }

    if config.keys.is_none() || config.input.is_some() {
        replay(&mut session, config.input)?;
    }

    let mut stdout = io::stdout().lock();
    if config.debug_dump {
        let cursor = (session.state.cursor.col, session.state.cursor.row);
        write!(stdout, "{}", DebugRenderer::render(session.sink(), cursor))?;
        stdout.flush()?;
    } else {
        Renderer::new(scheme).render(session.sink(), &mut stdout)?;
    }

    Ok(())
}

/// Read the capture on a worker thread and apply it through the session's
/// output handle
fn replay(session: &mut Session<GridSink>, input: Option<PathBuf>) -> anyhow::Result<()> {
    let handle = session.output_handle();

    let reader = thread::spawn(move || -> anyhow::Result<usize> {
        let mut source: Box<dyn Read> = match &input {
            Some(path) => Box::new(
                File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
            ),
            None => Box::new(io::stdin()),
        };

        let mut buffer = vec![0u8; 4096];
        let mut total = 0;
        loop {
            let n = source.read(&mut buffer).context("Failed to read input")?;
            if n == 0 {
                break;
            }
            total += n;
            handle.output_bytes(&buffer[..n])?;
        }
        Ok(total)
    });

    // Apply chunks as they arrive, then whatever is left after the reader ends
    while !reader.is_finished() {
        if !session.process_output() {
            thread::sleep(std::time::Duration::from_millis(5));
        }
    }
    session.process_output();

    let total = reader
        .join()
        .map_err(|_| anyhow::anyhow!("Reader thread panicked"))??;
    info!("Replayed {} bytes", total);
    Ok(())
}
