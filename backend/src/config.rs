use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Room server for the party dare game.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "DARE_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Keep the room directory in this JSON file instead of memory only
    #[arg(long, env = "PERSIST_PATH")]
    pub persist_path: Option<PathBuf>,

    /// Room broadcasts buffered per subscriber before it starts lagging
    #[arg(long, env = "DARE_CHANNEL_CAPACITY", default_value = "32")]
    pub channel_capacity: usize,

    /// Fixed seed for room codes
    #[arg(long, env = "DARE_SEED")]
    pub seed: Option<u64>,
}
