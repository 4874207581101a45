//==================================================
// File: logging/mod.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Tracing setup for the s4pd binary
// Objective: Install one fmt subscriber filtered by RUST_LOG and verbosity
//==================================================

use std::sync::OnceLock;

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::SubscriberBuilder;

static INIT: OnceLock<()> = OnceLock::new();

/// Map `-v` repetitions onto a default level. `RUST_LOG` still wins.
pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialize tracing once per process; later calls are ignored.
pub fn init(verbosity: u8) {
    INIT.get_or_init(|| {
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(level_for(verbosity)).into())
            .from_env_lossy();
        SubscriberBuilder::default()
            .with_env_filter(filter)
            .with_target(true)
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    });
    tracing::debug!(verbosity, "tracing initialised");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_the_level() {
        assert_eq!(level_for(0), Level::WARN);
        assert_eq!(level_for(2), Level::DEBUG);
        assert_eq!(level_for(9), Level::TRACE);
    }
}

//==================================================
// End of file
//==================================================
