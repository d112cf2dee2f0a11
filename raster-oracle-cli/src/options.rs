use clap::{Parser, Subcommand, ValueEnum};
use log::{info, LevelFilter};
use raster_oracle::VectorFormat;

/// Workaround for parsing the different log level
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

/// The encoding of the vector files
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum FileFormat {
    Yaml,
    Bincode,
}

impl From<FileFormat> for VectorFormat {
    fn from(value: FileFormat) -> Self {
        match value {
            FileFormat::Yaml => VectorFormat::Yaml,
            FileFormat::Bincode => VectorFormat::Bincode,
        }
    }
}

/// CLI interface for generating golden vectors for the rasterizer hardware and checking captured
/// hardware responses against them.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Options {
    /// The log level
    #[arg(short, value_enum, long, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// The bench configuration file
    #[arg(short, long)]
    pub config: String,

    /// The encoding of the vector and response files
    #[arg(short, value_enum, long, default_value_t = FileFormat::Yaml)]
    pub format: FileFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generates the golden vectors
    Generate(GenerateOptions),

    /// Checks hardware responses against golden vectors
    Verify(VerifyOptions),
}

/// The arguments for generating golden vectors
#[derive(Parser, Debug, Clone)]
pub struct GenerateOptions {
    /// The output file for the golden vectors
    #[arg(short, long)]
    pub output: String,

    /// Optionally, a PGM file for the final depth buffer
    #[arg(short, long)]
    pub dump_depth: Option<String>,
}

/// The arguments for checking hardware responses
#[derive(Parser, Debug, Clone)]
pub struct VerifyOptions {
    /// The golden vector file
    #[arg(short, long)]
    pub golden: String,

    /// The captured hardware responses
    #[arg(short, long)]
    pub responses: String,

    /// Stop at the first mismatch
    #[arg(long)]
    pub fail_fast: bool,

    /// Skip a stage without any responses instead of failing
    #[arg(long)]
    pub skip_missing: bool,
}

impl Options {
    /// Dumps the options to the log.
    pub fn dump_to_log(&self) {
        info!("Log Level: {:?}", self.log_level);
        info!("Config file: {:?}", self.config);
        info!("File format: {:?}", self.format);

        match &self.command {
            Command::Generate(o) => {
                info!("Output file: {:?}", o.output);
                if let Some(d) = &o.dump_depth {
                    info!("Depth dump: {:?}", d);
                }
            }
            Command::Verify(o) => {
                info!("Golden file: {:?}", o.golden);
                info!("Responses file: {:?}", o.responses);
                info!("Fail fast: {}", o.fail_fast);
                info!("Skip missing stages: {}", o.skip_missing);
            }
        }
    }
}
