#![no_main]

use handlegen::frontend::{SourceFile, build_snapshot};
use handlegen::pipeline::{Driver, PassInput};
use handlegen::GeneratorConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // If the source parses, a full pass must never panic
        if let Ok(snapshot) = build_snapshot(&[SourceFile::new("fuzz.rs", s)]) {
            let driver = Driver::new(GeneratorConfig::default());
            let _ = driver.run(&PassInput { snapshot, files: Vec::new() });
        }
    }
});
