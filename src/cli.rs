mod burrow;
mod frank_energie;
mod watch;

use clap::{Parser, Subcommand};

pub use self::{burrow::BurrowArgs, frank_energie::FrankEnergieArgs, watch::WatchArgs};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: log in, discover the batteries, and keep polling them.
    #[clap(name = "watch")]
    Watch(Box<WatchArgs>),

    /// Development tools: one-shot queries.
    #[clap(name = "burrow")]
    Burrow(Box<BurrowArgs>),
}
