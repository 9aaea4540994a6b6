//! Analyzer tests, grouped by check

mod test_components;
mod test_names;
mod test_runs;
mod test_valid_instruments;

use raysim_core::{analyze_instrument, parse_instrument, Diagnostics};

/// Parse `source` (which must be syntactically valid) and analyze it
pub fn analyze(source: &str) -> Diagnostics {
    let instrument = parse_instrument(source).unwrap();
    analyze_instrument(&instrument)
}

pub fn has_error(diagnostics: &Diagnostics, needle: &str) -> bool {
    diagnostics.errors().any(|e| e.message.contains(needle))
}
