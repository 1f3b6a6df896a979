//! Benchmarks for data processing operations
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use scopevis_rs::acquisition::protocol::encode_waveform;
use scopevis_rs::acquisition::{decode, DemoSignalGenerator, LineFramer, SampleScaler};
use scopevis_rs::analysis::FftAnalyzer;
use scopevis_rs::config::AppConfig;
use scopevis_rs::pipeline::TriggerEngine;
use scopevis_rs::render::{render, RenderConfig};
use scopevis_rs::types::{TriggerMode, TriggerSlope};

fn sine_codes(len: usize) -> Vec<i32> {
    (0..len)
        .map(|i| (511.0 + 400.0 * (i as f64 * 0.05).sin()) as i32)
        .collect()
}

fn bench_line_framing(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_framing");
    let line = format!("{}\n", encode_waveform(&sine_codes(512)));
    let stream = line.repeat(16);

    for chunk in [7usize, 64, 512, 4096].iter() {
        group.throughput(Throughput::Bytes(stream.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(chunk), chunk, |b, &chunk| {
            b.iter(|| {
                let mut framer = LineFramer::new(4096);
                let mut count = 0;
                for piece in stream.as_bytes().chunks(chunk) {
                    count += framer.ingest(black_box(piece)).len();
                }
                count
            });
        });
    }

    group.finish();
}

fn bench_decode_and_scale(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_and_scale");
    let scaler = SampleScaler::default();

    for size in [64usize, 512, 2048].iter() {
        let line = encode_waveform(&sine_codes(*size));
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &line, |b, line| {
            b.iter(|| match decode(black_box(line)) {
                Ok(scopevis_rs::acquisition::ProtocolMessage::Waveform(codes)) => {
                    Some(scaler.scale(&codes))
                }
                _ => None,
            });
        });
    }

    group.finish();
}

fn bench_trigger(c: &mut Criterion) {
    let config = AppConfig::default();
    let mut demo = DemoSignalGenerator::new(&config.demo, 512);
    let frames: Vec<_> = (0..64).map(|_| demo.tick()).collect();

    c.bench_function("trigger_normal_64_frames", |b| {
        b.iter(|| {
            let mut trigger = TriggerEngine::new(TriggerMode::Normal, TriggerSlope::Rising, 2.5);
            frames
                .iter()
                .filter_map(|f| trigger.offer(black_box(f.clone())))
                .count()
        });
    });
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let config = AppConfig::default();
    let frame = DemoSignalGenerator::new(&config.demo, 512).tick();

    for (w, h) in [(800.0f32, 600.0f32), (1920.0, 1080.0)].iter() {
        let render_config = RenderConfig::from_config(&config, *w, *h);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", w, h)),
            &render_config,
            |b, rc| b.iter(|| render(Some(black_box(&frame)), rc)),
        );
    }

    group.finish();
}

fn bench_fft(c: &mut Criterion) {
    let samples: Vec<f64> = (0..512)
        .map(|i| (2.0 * std::f64::consts::PI * 50.0 * i as f64 / 10_000.0).sin())
        .collect();

    c.bench_function("fft_dominant_frequency_512", |b| {
        let mut analyzer = FftAnalyzer::new();
        b.iter(|| analyzer.dominant_frequency(black_box(&samples), 10_000.0));
    });
}

criterion_group!(
    benches,
    bench_line_framing,
    bench_decode_and_scale,
    bench_trigger,
    bench_render,
    bench_fft,
);

criterion_main!(benches);
