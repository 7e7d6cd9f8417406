use std::error::Error;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use chip8_host::config::Config;
use chip8_host::display::MonoTermDisplay;
use chip8_host::input::TermInput;
use chip8_host::keymap::KeyLayout;
use chip8_host::machine::Chip8Machine;
use chip8_host::scheduler::RefreshScheduler;
use chip8_host::Driver;

/// how long the input thread waits for a key before checking for cancellation
const INPUT_POLL: Duration = Duration::from_millis(5);

#[derive(Debug, Parser)]
#[command(version, about = "Run a CHIP-8 program in the terminal")]
struct Args {
    /// program image to load at 0x200
    rom: PathBuf,

    /// TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// seed for the core's random number generator
    #[arg(short, long)]
    seed: Option<u64>,

    /// TOML register snapshot applied after loading
    #[arg(short, long)]
    registers: Option<PathBuf>,

    /// host keys for the hex keypad: conventional or literal
    #[arg(short, long)]
    layout: Option<KeyLayout>,

    /// write the log here instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(config: &Config) -> Result<(), Box<dyn Error>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)?,
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    match &config.log_file {
        Some(path) => builder
            .with_ansi(false)
            .with_writer(Mutex::new(File::create(path)?))
            .init(),
        None => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(layout) = args.layout {
        config.layout = layout;
    }
    if args.log_file.is_some() {
        config.log_file = args.log_file.clone();
    }
    init_logging(&config)?;

    // initialise
    let seed = config.seed.unwrap_or_else(clock_seed);
    let driver: Driver<Chip8Machine> = Driver::with_seed(seed, config.layout);

    // load a program
    if let Err(e) = driver.load_file(&args.rom) {
        error!(rom = ?args.rom, %e, "can't load program");
        return Err(e.into());
    }
    if let Some(path) = &args.registers {
        let registers = driver
            .debug()
            .write_registers_toml(&std::fs::read_to_string(path)?)?;
        info!(?registers, "registers applied");
    }

    let (width, height) = driver.session().lock().frame_size();
    let mut display = MonoTermDisplay::new(width, height)?;

    let input_driver = driver.clone();
    let key_hold = config.key_hold();
    let input = thread::spawn(move || -> io::Result<()> {
        let result = (|| -> io::Result<()> {
            let mut input = TermInput::new(key_hold)?;
            while !input_driver.control().is_cancelled() {
                for event in input.poll_events(INPUT_POLL)? {
                    if !input_driver.handle_host_event(event) {
                        return Ok(());
                    }
                }
            }
            Ok(())
        })();
        // nobody is left to press Esc
        input_driver.control().cancel();
        result
    });

    info!("Backspace resets, F5 reloads the program, Esc quits");
    if config.autostart {
        driver.control().start();
    } else {
        info!("press Enter to start");
    }

    let mut scheduler = RefreshScheduler::new(config.refresh_rate);
    let pumped = driver.render_pump().run(&mut scheduler, &mut display);
    driver.control().cancel();

    match input.join() {
        Ok(Err(e)) => error!(%e, "input failed"),
        Err(_) => error!("input thread panicked"),
        Ok(Ok(())) => {}
    }
    drop(display);

    // shove some junk on stdout to stop the cli messing up the last frame
    for _ in 0..(height / 2 + 2) {
        println!();
    }
    pumped?;
    Ok(())
}
