use std::time::{Duration, Instant};

use env_logger::Env;

/// Initialize the global logger. `RUST_LOG` overrides the default filter.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_target(false)
        .try_init();
}

/// Named stopwatch that logs its elapsed time when finished.
pub struct Timer {
    label: &'static str,
    start: Instant,
}

impl Timer {
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn finish(self) -> Duration {
        let elapsed = self.start.elapsed();
        log::info!("{}: {} ms", self.label, elapsed.as_millis());
        elapsed
    }
}
