use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ytsum",
    about = "Web form that fetches and shows YouTube video transcripts",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Address to listen on [default: 127.0.0.1:8080]
    #[arg(long)]
    pub listen: Option<SocketAddr>,

    /// Preferred transcript languages, in priority order [default: en]
    #[arg(short, long, value_delimiter = ',')]
    pub lang: Vec<String>,

    /// HTML template to render instead of the built-in page
    #[arg(short, long)]
    pub template: Option<PathBuf>,

    /// Seconds to wait for a transcript before giving up [default: 30]
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,
}
