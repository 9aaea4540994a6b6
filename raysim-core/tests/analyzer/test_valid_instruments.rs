//! The bundled instrument files must analyze cleanly

use raysim_core::tests::test_helpers::load_inst;
use raysim_core::{analyze_instrument, parse_instrument};

#[test]
fn test_data_files_have_no_diagnostics() {
    for file in ["data/guide.inst", "data/large.inst", "data/pencil.inst"] {
        let source = load_inst(file).unwrap();
        let instrument = parse_instrument(&source).unwrap();
        let diagnostics = analyze_instrument(&instrument);
        assert!(diagnostics.is_empty(), "{}: {}", file, diagnostics);
    }
}
