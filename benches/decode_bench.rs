//! Performance benchmarks for the Wiegand decoder.
//!
//! These benchmarks replay pre-computed edge timelines through the state
//! machine to measure per-frame decode cost and raw edge throughput.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench decode_bench
//! ```

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use gatewire_core::{
    Decoder, DecoderConfig, ExpectedBits, FrameBuffer, ParityAccumulator, Pin,
};
use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Low time of a simulated pulse.
const PULSE_WIDTH: Duration = Duration::from_micros(50);

/// Spacing between consecutive simulated pulses.
const PULSE_GAP: Duration = Duration::from_millis(2);

/// Idle time that safely exceeds the default frame timeout.
const IDLE_GAP: Duration = Duration::from_millis(50);

/// Pre-compute the edge timeline of one frame, most significant bit first.
fn frame_edges(value: u64, bits: u8, start: Instant) -> Vec<(Pin, bool, Instant)> {
    let mut edges = Vec::with_capacity(bits as usize * 2);
    let mut at = start;
    for i in (0..bits).rev() {
        let pin = Pin::for_bit(value >> i & 1 != 0);
        edges.push((pin, false, at));
        at += PULSE_WIDTH;
        edges.push((pin, true, at));
        at += PULSE_GAP;
    }
    edges
}

/// Build a decoder that is begun, attached and settled at `start`.
fn ready_decoder(config: DecoderConfig, start: Instant) -> Decoder {
    let mut decoder = Decoder::new();
    decoder.begin_at(config, start);
    decoder.set_pin_at(Pin::Data0, true, start);
    decoder.set_pin_at(Pin::Data1, true, start);
    decoder.tick_at(start + IDLE_GAP);
    decoder
}

/// A valid 26-bit frame around a 24-bit payload.
fn framed26(payload: u64) -> u64 {
    let mut left = false;
    for i in 12..24 {
        left ^= payload >> i & 1 != 0;
    }
    let mut right = true;
    for i in 0..12 {
        right ^= payload >> i & 1 != 0;
    }
    (u64::from(left) << 25) | (payload << 1) | u64::from(right)
}

/// Benchmark decoding a standard 26-bit frame from its edge timeline.
fn bench_decode_standard26(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_standard26");
    group.throughput(Throughput::Elements(1));

    let start = Instant::now();
    let frame_start = start + IDLE_GAP + Duration::from_millis(1);
    let edges = frame_edges(framed26(0x00C0_FFEE), 26, frame_start);
    let close_at = frame_start + Duration::from_secs(1);
    let sink = Arc::new(AtomicU64::new(0));

    group.bench_function("decode_26bit_frame", |b| {
        b.iter(|| {
            let mut decoder = ready_decoder(DecoderConfig::default(), start);
            let sink = Arc::clone(&sink);
            decoder.on_data(move |message| {
                sink.fetch_add(message.value(), Ordering::Relaxed);
            });
            for &(pin, level, at) in &edges {
                decoder.set_pin_at(pin, level, at);
            }
            decoder.tick_at(close_at);
            black_box(&decoder);
        });
    });

    group.finish();
}

/// Benchmark a burst of fixed-length keypresses.
///
/// With a fixed expected length every frame closes at its final bit, so
/// the burst needs no idle gaps between frames.
fn bench_decode_keypress_burst(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_keypress_burst");
    group.throughput(Throughput::Elements(16));

    let start = Instant::now();
    let mut edges = Vec::new();
    let mut at = start + IDLE_GAP + Duration::from_millis(1);
    for digit in 0..16u64 {
        let frame = frame_edges(digit, 4, at);
        at = frame.last().map(|&(_, _, edge_at)| edge_at + PULSE_GAP).unwrap_or(at);
        edges.extend(frame);
    }
    let config = DecoderConfig::new(ExpectedBits::count(4).unwrap(), true);
    let sink = Arc::new(AtomicU64::new(0));

    group.bench_function("decode_16_keypresses", |b| {
        b.iter(|| {
            let mut decoder = ready_decoder(config, start);
            let sink = Arc::clone(&sink);
            decoder.on_data(move |message| {
                sink.fetch_add(message.value(), Ordering::Relaxed);
            });
            for &(pin, level, at) in &edges {
                decoder.set_pin_at(pin, level, at);
            }
            black_box(&decoder);
        });
    });

    group.finish();
}

/// Benchmark raw edge throughput with decoding off.
fn bench_raw_edge_rate(c: &mut Criterion) {
    let mut group = c.benchmark_group("raw_edge_rate");

    let start = Instant::now();
    let frame_start = start + IDLE_GAP + Duration::from_millis(1);
    let edges = frame_edges(0xDEAD_BEEF_CAFE_F00D, 64, frame_start);
    group.throughput(Throughput::Elements(edges.len() as u64));
    let config = DecoderConfig::new(ExpectedBits::Any, false);

    group.bench_function("raw_64bit_frame_edges", |b| {
        b.iter(|| {
            let mut decoder = ready_decoder(config, start);
            for &(pin, level, at) in &edges {
                decoder.set_pin_at(pin, level, at);
            }
            black_box(decoder.pending_bits());
        });
    });

    group.finish();
}

/// Benchmark the two parity accounting strategies over a full frame.
fn bench_parity_accounting(c: &mut Criterion) {
    let mut group = c.benchmark_group("parity_accounting");
    group.throughput(Throughput::Elements(1));

    let value = 0xDEAD_BEEF_CAFE_F00Du64;

    group.bench_function("incremental_observe", |b| {
        b.iter(|| {
            let mut frame = FrameBuffer::new();
            let mut parity = ParityAccumulator::new();
            for i in (0..64).rev() {
                frame.push(value >> i & 1 != 0);
                parity.observe(&frame);
            }
            black_box(parity.is_valid());
        });
    });

    group.bench_function("scan_once", |b| {
        b.iter(|| {
            let mut frame = FrameBuffer::new();
            for i in (0..64).rev() {
                frame.push(value >> i & 1 != 0);
            }
            black_box(ParityAccumulator::scan(&frame).is_valid());
        });
    });

    group.finish();
}

/// Benchmark stripping parity framing from a full frame buffer.
fn bench_frame_alignment(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_alignment");
    group.throughput(Throughput::Elements(1));

    let value = framed26(0x00C0_FFEE);
    let mut frame = FrameBuffer::new();
    for i in (0..26).rev() {
        frame.push(value >> i & 1 != 0);
    }

    group.bench_function("align_26bit_payload", |b| {
        b.iter(|| {
            let message = frame.aligned(1, 25);
            black_box(message.value());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_decode_standard26,
    bench_decode_keypress_burst,
    bench_raw_edge_rate,
    bench_parity_accounting,
    bench_frame_alignment,
);

criterion_main!(benches);
