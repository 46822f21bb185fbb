//! A command-line driver for the parsekit combinator library.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub mod calc;
pub mod cli;

fn main() -> anyhow::Result<()> {
    better_panic::install();

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();

    argh::from_env::<cli::Cli>().handle()
}
