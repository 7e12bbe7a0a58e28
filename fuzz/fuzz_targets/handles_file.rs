#![no_main]

use handlegen::generators::handles_file::check_file;
use handlegen::model::AdditionalFile;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Handle files are UTF-8 text; ignore anything else
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = check_file(&AdditionalFile::new("fuzz.handles.csv", s));
    }
});
