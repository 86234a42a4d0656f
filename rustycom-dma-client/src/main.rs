mod config;
mod script;
mod time_source;

use log::{debug, error, info, LevelFilter};
use rustycom_dma_core::snes::Snes;

use std::process;

use config::Config;
use script::Script;
use time_source::TimeSource;

const HELP: &str = "\
Usage: rustycom_dma_client [SCRIPT] [--frames N] [--log-level LEVEL] [--save-config]

Runs a register script against the DMA unit and reports what it moved.
";

struct Args {
    script_path: Option<String>,
    frames: Option<u32>,
    log_level: Option<String>,
    save_config: bool,
}

fn parse_args() -> Result<Args, pico_args::Error> {
    let mut pargs = pico_args::Arguments::from_env();
    if pargs.contains(["-h", "--help"]) {
        print!("{}", HELP);
        process::exit(0);
    }
    let args = Args {
        save_config: pargs.contains("--save-config"),
        frames: pargs.opt_value_from_str("--frames")?,
        log_level: pargs.opt_value_from_str("--log-level")?,
        script_path: pargs.opt_free_from_str()?,
    };
    let rest = pargs.finish();
    if !rest.is_empty() {
        eprintln!("Ignoring extra arguments {:?}", rest);
    }
    Ok(args)
}

fn setup_logger(level: LevelFilter) -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%H:%M:%S%.3f]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(why) => {
            eprintln!("{}\n\n{}", why, HELP);
            process::exit(2);
        }
    };

    let mut config = match Config::load() {
        Ok(config) => config,
        Err(why) => {
            eprintln!("{}", why);
            process::exit(1);
        }
    };
    if let Some(script_path) = args.script_path {
        config.script_path = script_path;
    }
    if let Some(frames) = args.frames {
        config.frames = frames;
    }
    if let Some(log_level) = args.log_level {
        config.log_level = log_level;
    }

    let level = config.log_level.parse().unwrap_or_else(|_| {
        eprintln!("Unknown log level '{}', using info", config.log_level);
        LevelFilter::Info
    });
    if let Err(why) = setup_logger(level) {
        eprintln!("Logger init failed: {}", why);
    }

    if args.save_config {
        if let Err(why) = config.save() {
            error!("{}", why);
        }
    }

    if config.script_path.is_empty() {
        error!("No script given");
        eprint!("{}", HELP);
        process::exit(2);
    }

    if let Err(why) = run(&config) {
        error!("{}", why);
        process::exit(1);
    }
}

fn run(config: &Config) -> Result<(), String> {
    let script = Script::load(&config.script_path)?;
    let rom_bytes = script.rom_bytes()?;
    if !rom_bytes.is_empty() {
        info!("Read {} bytes from {}", rom_bytes.len(), script.rom_path);
    }

    let mut snes = Snes::new(rom_bytes);
    script.apply(&mut snes)?;
    let setup_writes = snes.abus.take_bbus_writes();
    info!(
        "Setup: {} B-bus writes, {} DMA cycles",
        setup_writes.len(),
        snes.dma_cycles()
    );
    log_writes(&setup_writes);

    let frames = script.frames.unwrap_or(config.frames);
    let time_source = TimeSource::new();
    for _ in 0..frames {
        let cycles_before = snes.dma_cycles();
        snes.run_frame();
        let writes = snes.abus.take_bbus_writes();
        info!(
            "Frame {}: {} B-bus writes, {} DMA cycles",
            snes.frame(),
            writes.len(),
            snes.dma_cycles() - cycles_before
        );
        log_writes(&writes);
        snes.clear_irq_lock();
    }
    info!("Ran {} frames in {} us", frames, time_source.elapsed_us());

    println!("Total DMA cycles: {}", snes.dma_cycles());
    println!("CH  PARAM PORT  A-BUS    SIZE  TABLE  IND      LINE");
    for (i, channel) in snes.dma.channels().iter().enumerate() {
        println!(
            "{}   ${:02X}   $21{:02X} ${:02X}:{:04X} ${:04X} ${:04X} ${:02X}:{:04X} ${:02X}{}",
            i,
            channel.read_control(),
            channel.target_address,
            channel.source_bank,
            channel.source_address,
            channel.transfer_size,
            channel.hdma_address,
            channel.indirect_bank,
            channel.indirect_address,
            channel.line_counter,
            if channel.hdma_is_active() { " HDMA" } else { "" }
        );
    }
    Ok(())
}

fn log_writes(writes: &[(u8, u8)]) {
    for (port, value) in writes {
        debug!("$21{:02X} <- ${:02X}", port, value);
    }
}
