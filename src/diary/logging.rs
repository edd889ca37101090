use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding a `tracing` filter directive, e.g. `diary=trace`.
pub const LOG_ENV: &str = "DIARY_LOG";

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "diary=debug"
    } else {
        "diary=warn"
    }
}

/// Installs the stderr subscriber. `DIARY_LOG` wins over `verbose`.
///
/// Calling it twice is harmless; the second subscriber is ignored.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_raises_the_default_level() {
        assert_eq!(default_directive(false), "diary=warn");
        assert_eq!(default_directive(true), "diary=debug");
    }

    #[test]
    fn init_twice_does_not_panic() {
        init(false);
        init(true);
    }
}
