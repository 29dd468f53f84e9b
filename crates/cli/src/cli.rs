use crate::logging::{LogLevel, TracingFormat};
use clap::{Parser, ValueEnum};
use cubx_resolver::DEFAULT_FETCH_TIMEOUT_SECS;

#[derive(Parser, Debug)]
#[command(name = "cubx-dependency-resolver")]
#[command(about = "Resolve webpackage artifact dependencies into ordered resource lists")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(
        short = 'u',
        long,
        env = "CUBX_BASE_URL",
        help = "Base url the webpackages are deployed at"
    )]
    pub base_url: String,

    #[arg(
        short = 'd',
        long,
        env = "CUBX_ROOT_DEPENDENCIES",
        help = "Root dependencies as JSON array or path to a file containing one"
    )]
    pub root_dependencies: String,

    #[arg(
        short = 'e',
        long,
        help = "Exclude rules appended to every root dependency, as JSON array or file path"
    )]
    pub excludes: Option<String>,

    #[arg(
        short = 't',
        long = "type",
        help = "What to print",
        default_value = "list",
        value_enum
    )]
    pub output: OutputType,

    #[arg(
        short = 'm',
        long,
        env = "CUBX_RUNTIME_MODE",
        help = "Runtime mode selecting resource files (prod, dev)"
    )]
    pub mode: Option<String>,

    #[arg(long, help = "Resolve version conflicts automatically")]
    pub acr: bool,

    #[arg(
        long,
        env = "CUBX_FETCH_TIMEOUT",
        help = "Timeout for a single manifest request in seconds",
        default_value_t = DEFAULT_FETCH_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,

    #[arg(
        short = 'l',
        long,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    #[arg(long, help = "Log output format", default_value = "compact", value_enum)]
    pub log_format: TracingFormat,
}

/// Output views of a resolution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputType {
    /// Dependency tree as built from the manifests
    Raw,
    /// Dependency tree after excludes and duplicates were removed
    Resolved,
    /// Ordered resource list
    List,
    /// Ordered list of webpackage ids
    Wplist,
    /// Manifests of the resolved webpackages
    Mlist,
}
