//! famicore - run an iNES ROM headless (or in a window with `--features display`).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use famicore::{LoadOptions, Nes};

/// NES emulator core runner
#[derive(Parser, Debug)]
#[command(name = "famicore")]
#[command(about = "Run an NES ROM on the famicore emulator core", long_about = None)]
struct Args {
    /// Path to the iNES ROM file
    rom: PathBuf,

    /// Number of frames to run headless
    #[arg(short, long, default_value = "60")]
    frames: u64,

    /// Log every executed instruction (implies --log-level trace)
    #[arg(short, long)]
    trace: bool,

    /// Log level: error, warn, info, debug or trace
    #[arg(long, default_value = "info")]
    log_level: log::LevelFilter,

    /// Allocate 8 KiB CHR RAM when the header declares no CHR ROM
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    chr_ram: bool,

    /// Write the last frame to this PNG file
    #[cfg(feature = "screenshot")]
    #[arg(long)]
    screenshot: Option<PathBuf>,

    /// Open a window instead of running headless
    #[cfg(feature = "display")]
    #[arg(long)]
    window: bool,
}

/// Minimal stderr logger; the library only emits through the `log` facade.
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.trace {
        log::LevelFilter::Trace
    } else {
        args.log_level
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }

    let options = LoadOptions {
        chr_ram_when_absent: args.chr_ram,
        ..LoadOptions::default()
    };
    let mut nes = match Nes::from_ines_file(&args.rom, options) {
        Ok(nes) => nes,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", args.rom.display());
            return ExitCode::FAILURE;
        }
    };

    #[cfg(feature = "display")]
    if args.window {
        return match famicore::display::run(nes) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Display error: {e}");
                ExitCode::FAILURE
            }
        };
    }

    for frame in 0..args.frames {
        if let Err(e) = nes.run_frame() {
            eprintln!("Stopped in frame {frame}: {e}");
            return ExitCode::FAILURE;
        }
    }
    log::info!(
        "ran {} frames, {} CPU cycles, PC=${:04X}",
        args.frames,
        nes.cpu().cycles(),
        nes.cpu().pc()
    );

    #[cfg(feature = "screenshot")]
    if let Some(path) = &args.screenshot {
        if let Err(e) = famicore::screenshot::save_png(nes.frame_buffer(), path) {
            eprintln!("Failed to write {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
