#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(xml) = std::str::from_utf8(data) else {
        return;
    };

    // Parse without validation, then run the graph checks on whatever came out
    if let Ok(mut model) = lib3mf_resolve::parser::parse_model_xml(xml) {
        let issues = lib3mf_resolve::validator::validate_model_report(&mut model);
        if issues.is_empty() {
            let _ = lib3mf_resolve::flatten_build(&model);
        }
    }
});
