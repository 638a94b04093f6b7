#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_raw_response::charset::{detect_meta_charset, transcode};

#[derive(Arbitrary, Debug)]
struct FuzzCharset {
    to: String,
    body: Vec<u8>,
}

fuzz_target!(|input: FuzzCharset| {
    if let Some(from) = detect_meta_charset(&input.body) {
        let _ = transcode(&input.body, &from, &input.to);
    }
    let _ = transcode(&input.body, "utf-8", &input.to);
});
