#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_raw_response::content_type::ContentType;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(ct) = ContentType::parse(s) {
            let _ = ct.media_type();
            let _ = ct.subtype();
            let _ = ct.mime_type();
            let _ = ct.charset();
            let _ = ct.is_text();
            let displayed = ct.to_string();
            let _ = ContentType::parse(&displayed);
        }
    }
});
