//! Terminal logging setup for the `jsqd` binary.
//!
//! `RUST_LOG` takes precedence over the level passed in, e.g.
//! `RUST_LOG=power_of_d::bank=debug jsqd`.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter directives for `level`. With `verbose` the per-job trace lines of
/// the bank stay visible even when `level` is quieter than `info`.
pub fn default_directives(level: &str, verbose: bool) -> String {
    let mut directives = format!("power_of_d={level},jsqd={level},des={level}");
    if verbose {
        let bank = level
            .parse::<LevelFilter>()
            .map_or(LevelFilter::INFO, |parsed| parsed.max(LevelFilter::INFO));
        directives.push_str(&format!(",power_of_d::bank={bank}"));
    }
    directives
}

/// Install a fmt subscriber filtered at `level` for this crate and the kernel.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(level: &str, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level, verbose)));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_level(true))
        .with(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_level_is_applied_to_every_target() {
        assert_eq!(
            default_directives("warn", false),
            "power_of_d=warn,jsqd=warn,des=warn"
        );
    }

    #[test]
    fn verbose_lifts_bank_to_info_under_quiet_level() {
        let directives = default_directives("warn", true);
        assert!(directives.ends_with(",power_of_d::bank=info"));
        assert!(directives.parse::<EnvFilter>().is_ok());
    }

    #[test]
    fn verbose_keeps_a_more_detailed_level() {
        assert!(default_directives("debug", true).ends_with(",power_of_d::bank=debug"));
        assert!(default_directives("trace", true).ends_with(",power_of_d::bank=trace"));
    }
}
