//! Criterion benchmarks for the wire codec and stream parser.
//!
//! The hot path of the client is `DMMV` at the server's mouse sampling rate
//! (hundreds of frames per second), with `DKDN`/`DKUP` bursts during typing.
//! These benchmarks keep an eye on per-frame encode/decode cost and on the
//! parser's buffer management under small-chunk feeding.
//!
//! Run with:
//!
//! ```bash
//! cargo bench --package flowlink-core --bench codec_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use flowlink_core::protocol::messages::{ClipboardMsg, EnterMsg, KeyDownMsg, ScreenInfoMsg};
use flowlink_core::{decode_payload, encode_frame, encode_payload, Message, StreamParser};

fn fixtures() -> Vec<(&'static str, Message)> {
    vec![
        ("CALV", Message::KeepAlive),
        (
            "CINN",
            Message::Enter(EnterMsg {
                entry_x: 100,
                entry_y: 100,
                sequence: 1,
                mod_mask: 0x2000,
            }),
        ),
        ("DMMV", Message::MouseMove { x: 960, y: 540 }),
        (
            "DKDN",
            Message::KeyDown(KeyDownMsg {
                key_id: 0x61,
                mod_mask: 0,
                key_button: 30,
            }),
        ),
        (
            "DINF",
            Message::ScreenInfo(ScreenInfoMsg {
                left: 0,
                top: 0,
                width: 1920,
                height: 1080,
                warp_zone: 0,
                mouse_x: 400,
                mouse_y: 300,
            }),
        ),
        (
            "DCLP",
            Message::Clipboard(ClipboardMsg {
                id: 0,
                sequence: 1,
                mark: 0,
                data: "Hello, clipboard!".repeat(16),
            }),
        ),
    ]
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_payload");
    for (name, msg) in fixtures() {
        group.bench_with_input(BenchmarkId::new("msg", name), &msg, |b, msg| {
            b.iter(|| encode_payload(black_box(msg)))
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_payload");
    for (name, msg) in fixtures() {
        let bytes = encode_payload(&msg);
        group.bench_with_input(BenchmarkId::new("msg", name), &bytes, |b, bytes| {
            b.iter(|| decode_payload(black_box(bytes)).expect("decode must succeed"))
        });
    }
    group.finish();
}

/// A 100-frame DMMV burst fed to the parser in 128-byte chunks, the shape of
/// a busy socket read loop.
fn bench_parser_burst(c: &mut Criterion) {
    let stream: Vec<u8> = (0..100)
        .flat_map(|i| {
            encode_frame(&Message::MouseMove {
                x: i as i16,
                y: (i * 2) as i16,
            })
        })
        .collect();

    c.bench_function("parser_dmmv_burst_100", |b| {
        b.iter(|| {
            let mut parser = StreamParser::new();
            let mut n = 0usize;
            for chunk in stream.chunks(128) {
                parser.feed(black_box(chunk));
                while let Some(msg) = parser.next_message().expect("parse must succeed") {
                    black_box(&msg);
                    n += 1;
                }
            }
            assert_eq!(n, 100);
        })
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_parser_burst);
criterion_main!(benches);
