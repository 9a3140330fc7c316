use clap::{ArgAction, Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Parser)]
#[command(name = "class-preload")]
#[command(about = "Enumerate every class under a package on a classpath of directories and jars")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Classpath roots; falls back to $CLASSPATH, then the current directory.
    #[arg(long = "classpath", visible_alias = "cp", value_name = "CLASSPATH")]
    pub classpath: Option<String>,

    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// List every class a preload of the given packages would initialize.
    Scan {
        #[arg(required = true, value_name = "PACKAGE")]
        packages: Vec<String>,

        #[arg(long)]
        no_recursive: bool,

        #[arg(long)]
        skip_inner: bool,

        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Exit with status 1 when any failure was collected.
        #[arg(long)]
        strict: bool,
    },
    /// Print the resource locations a package resolves to.
    Resources {
        #[arg(value_name = "PACKAGE")]
        package: String,
    },
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}
