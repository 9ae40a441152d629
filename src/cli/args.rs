use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config YAML file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Port for the HTTP server (overrides the config file)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Enable debug logging for internal details
    #[arg(short, long)]
    pub debug: bool,
}
