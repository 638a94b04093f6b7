#![no_main]

use std::io::Cursor;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_raw_response::{HeadScanner, ParseOptions, locate, locate_in_reader};

#[derive(Arbitrary, Debug)]
struct FuzzScan {
    max_head_size: u16,
    follow_interim_responses: bool,
    chunk_size: u8,
    data: Vec<u8>,
}

fuzz_target!(|input: FuzzScan| {
    let options = ParseOptions {
        max_head_size: input.max_head_size as usize,
        follow_interim_responses: input.follow_interim_responses,
    };

    let expected = locate(&input.data, &options);

    // 分割投入でも一括投入と同じ結果になる
    let mut scanner = HeadScanner::new(options.clone());
    for chunk in input.data.chunks((input.chunk_size as usize).max(1)) {
        scanner.feed(chunk);
    }
    assert_eq!(scanner.finish(), expected);

    let mut reader = Cursor::new(&input.data);
    let from_reader = locate_in_reader(&mut reader, &options).expect("cursor read");
    assert_eq!(from_reader, expected);

    if let Some(block) = expected {
        assert!(block.body_offset() <= input.data.len());
        let _ = block.parse();
    }
});
