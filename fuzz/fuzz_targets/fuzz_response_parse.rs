#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_raw_response::Response;

fuzz_target!(|data: &[u8]| {
    let response = Response::parse(data);
    let _ = response.status_line();
    let _ = response.status_code();
    let _ = response.content_type();
    for (name, value) in response.headers() {
        let _ = response.header(name);
        let _ = value.len();
    }
    if let Some(body) = response.body().as_bytes() {
        assert!(body.len() <= data.len());
        assert!(data.ends_with(body));
    }
    let _ = response.text();
    let _ = response.to_string();
});
