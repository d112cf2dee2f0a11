use std::{
    fs::File,
    io::{BufReader, BufWriter},
    time::Instant,
};

use anyhow::Result;
use clap::Parser;
use log::{error, info, warn, LevelFilter};
use options::{Command, GenerateOptions, Options, VerifyOptions};
use raster_oracle::{
    verify, zbuffer::DepthTestOracle, BenchConfig, GoldenGenerator, GoldenSet, HardwareResponses,
    MismatchPolicy, MissingStage, VectorFormat,
};

mod options;

/// Initializes the program logging
///
/// # Arguments
/// * `filter` - The log level filter, i.e., the minimum log level to be logged.
fn initialize_logging(filter: LevelFilter) {
    let mut builder = pretty_env_logger::formatted_timed_builder();

    builder.filter_level(filter).init();
}

/// Loads the bench configuration.
///
/// # Arguments
/// * `path` - The path to the YAML configuration.
fn load_config(path: &str) -> Result<BenchConfig> {
    let file = File::open(path).map_err(|err| {
        error!("Failed to open config file '{}': {:?}", path, err);
        err
    })?;

    let config = BenchConfig::read(BufReader::new(file))?;
    info!("Loaded config '{}'", path);

    Ok(config)
}

/// Replays the depth vectors and writes the final depth buffer as PGM.
///
/// # Arguments
/// * `config` - The bench configuration.
/// * `golden` - The generated golden vectors.
/// * `path` - The path of the PGM file.
fn dump_depth_buffer(config: &BenchConfig, golden: &GoldenSet, path: &str) -> Result<()> {
    let mut oracle = DepthTestOracle::new(config.depth.buffer)?;
    for case in golden.depth.iter() {
        let p = case.pixel;
        oracle.test_and_commit(p.x, p.y, p.z, p.func)?;
        if case.flush_after {
            oracle.flush();
        }
    }

    let file = File::create(path)?;
    oracle.buffer().write_as_pgm(BufWriter::new(file))?;
    info!("Wrote depth buffer to '{}'", path);

    Ok(())
}

/// Generates the golden vectors.
///
/// # Arguments
/// * `config` - The bench configuration.
/// * `format` - The output encoding.
/// * `options` - The generation options.
fn run_generate(config: BenchConfig, format: VectorFormat, options: &GenerateOptions) -> Result<()> {
    let t = Instant::now();
    let golden = GoldenGenerator::new(config.clone())?.run()?;
    info!(
        "Generated golden vectors in {} ms",
        t.elapsed().as_secs_f64() * 1e3f64
    );

    let file = File::create(&options.output).map_err(|err| {
        error!("Failed to create '{}': {:?}", options.output, err);
        err
    })?;
    golden.write(BufWriter::new(file), format)?;
    info!("Wrote golden vectors to '{}'", options.output);

    if let Some(path) = &options.dump_depth {
        dump_depth_buffer(&config, &golden, path)?;
    }

    Ok(())
}

/// Checks the hardware responses against the golden vectors.
///
/// # Arguments
/// * `config` - The bench configuration.
/// * `format` - The encoding of the input files.
/// * `options` - The verification options.
fn run_verify(config: BenchConfig, format: VectorFormat, options: &VerifyOptions) -> Result<()> {
    let golden = GoldenSet::read(BufReader::new(File::open(&options.golden)?), format)?;
    info!("Loaded golden vectors '{}'", options.golden);

    if golden.seed != config.seed {
        warn!(
            "Golden vectors were generated with seed {}, but the config uses seed {}",
            golden.seed,
            config.seed
        );
    }

    let responses =
        HardwareResponses::read(BufReader::new(File::open(&options.responses)?), format)?;
    info!("Loaded hardware responses '{}'", options.responses);

    let policy = if options.fail_fast {
        MismatchPolicy::FailFast
    } else {
        MismatchPolicy::Aggregate
    };

    let missing = if options.skip_missing {
        MissingStage::Skip
    } else {
        MissingStage::Fail
    };

    let report = verify(&golden, &responses, &config.clip, policy, missing)?;
    info!("All {} checks passed", report.num_checked);

    Ok(())
}

/// Runs the program.
///
/// # Arguments
/// * `options` - The program options.
fn run_program(options: Options) -> Result<()> {
    let config = load_config(&options.config)?;
    let format = options.format.into();

    match &options.command {
        Command::Generate(o) => run_generate(config, format, o),
        Command::Verify(o) => run_verify(config, format, o),
    }
}

fn main() {
    let options = Options::parse();
    initialize_logging(options.log_level.into());
    options.dump_to_log();

    match run_program(options) {
        Ok(_) => {
            info!("Program completed successfully");
        }
        Err(err) => {
            error!("Program failed: {:?}", err);
            std::process::exit(1);
        }
    }
}
