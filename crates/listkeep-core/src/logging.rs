//! Tracing subscriber setup for hosts embedding the core.

use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "listkeep_core=info";

/// Install a `fmt` subscriber filtered by `RUST_LOG`, with
/// `listkeep_core=info` added on top.
///
/// Returns `false` when a global subscriber was already installed, so
/// calling it more than once is harmless.
pub fn init() -> bool {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = DEFAULT_DIRECTIVE.parse::<Directive>() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_no_op() {
        init();
        assert!(!init());
    }
}
