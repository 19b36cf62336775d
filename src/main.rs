use anyhow::Context;
use clap::Parser;
use log::info;

use rc8_term::{
    app::{self, Config},
    emulator::Emulator,
    frontend::terminal::TerminalFrontend,
    random::WyRandSource,
};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// ROM file to load
    #[clap(value_parser)]
    filename: String,

    /// Instructions executed per second
    #[clap(
        short,
        long,
        value_parser = clap::value_parser!(u32).range(1..=1_000_000),
        default_value_t = 700
    )]
    freq: u32,

    /// Seed for the random number generator, for reproducible runs
    #[clap(long, value_parser)]
    seed: Option<u64>,

    /// Draw on a window instead of the terminal
    #[cfg(feature = "sdl")]
    #[clap(short, long, action)]
    window: bool,

    /// Size of each pixel on the window
    #[cfg(feature = "sdl")]
    #[clap(
        long,
        value_parser = clap::value_parser!(u32).range(1..=64),
        default_value_t = 10
    )]
    scale: u32,
}

#[cfg(feature = "sdl")]
fn start(cli: &Cli, emu: Emulator, config: &Config) -> Result<(), anyhow::Error> {
    use rc8_term::frontend::window::WindowFrontend;

    if cli.window {
        info!("using the window frontend");
        let mut frontend = WindowFrontend::new(cli.scale)?;
        return app::run(emu, &mut frontend, config);
    }

    info!("using the terminal frontend");
    let mut frontend = TerminalFrontend::new()?;
    app::run(emu, &mut frontend, config)
}

#[cfg(not(feature = "sdl"))]
fn start(_cli: &Cli, emu: Emulator, config: &Config) -> Result<(), anyhow::Error> {
    info!("using the terminal frontend");
    let mut frontend = TerminalFrontend::new()?;
    app::run(emu, &mut frontend, config)
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    // parse command-line arguments
    let cli = Cli::parse();

    // open the rom file
    let rom = std::fs::File::open(&cli.filename)
        .with_context(|| format!("error opening rom file: {}", &cli.filename))?;

    // load the rom
    let mut emu = Emulator::load_rom(rom).context("error loading rom")?;
    info!("loaded {}", &cli.filename);

    if let Some(seed) = cli.seed {
        emu.set_rng(Box::new(WyRandSource::with_seed(seed)));
    }

    // run
    let config = Config {
        frequency: cli.freq,
    };
    start(&cli, emu, &config)
}
