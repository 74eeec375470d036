use async_logger::{log_to, AsyncWriter, BufferHandler, Dispatch, LogStream, Severity};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use log::{info, LevelFilter};
use log4rs::{
    append::file::FileAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};
use std::sync::{Arc, Once};
use std::time::Duration;
use tempfile::tempdir;

const RECORDS_PER_ITER: u64 = 10_000;

static LOG4RS_INIT: Once = Once::new();

// Measures the hand-off alone; drained buffers go nowhere.
struct NullHandler;

impl BufferHandler for NullHandler {
    fn handle_buffer(&mut self, data: &[u8]) {
        black_box(data);
    }

    fn flush(&mut self) {}
}

fn setup_log4rs(log_file: &str) {
    LOG4RS_INIT.call_once(|| {
        let logfile = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new("{d} {l} - {m}{n}")))
            .append(true)
            .build(log_file)
            .unwrap();

        let config = Config::builder()
            .appender(Appender::builder().build("logfile", Box::new(logfile)))
            .build(Root::builder().appender("logfile").build(LevelFilter::Info))
            .unwrap();

        log4rs::init_config(config).unwrap();
    });
}

fn bench_formatting(c: &mut Criterion) {
    let mut group = c.benchmark_group("Formatting");
    group.throughput(Throughput::Elements(1));

    group.bench_function("mixed_values", |b| {
        let mut stream = LogStream::new();
        let mut i: u64 = 0;
        b.iter(|| {
            stream.reset_buffer();
            stream
                .append("request ")
                .append(black_box(i))
                .append(" took ")
                .append(black_box(0.125f64))
                .append("ms ok=")
                .append(black_box(true));
            i += 1;
            black_box(stream.buffer().len())
        });
    });

    group.bench_function("disabled_level", |b| {
        let dispatch = Dispatch::new();
        dispatch.set_output_hook(|bytes| {
            black_box(bytes);
        });
        b.iter(|| log_to!(&dispatch, Severity::Debug, "never built ", black_box(42u32)));
    });

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("Pipeline");
    group.sample_size(10);
    group.throughput(Throughput::Elements(RECORDS_PER_ITER));

    group.bench_function("async_writer_in_memory", |b| {
        let writer = Arc::new(AsyncWriter::<{ 4 * 1024 * 1024 }>::with_handler(NullHandler));
        writer.start().unwrap();
        let dispatch = Dispatch::new();
        AsyncWriter::install(&writer, &dispatch);

        b.iter(|| {
            for i in 0..RECORDS_PER_ITER {
                log_to!(&dispatch, Severity::Info, "Test perf: iteration=", i, " active=", true);
            }
        });
        writer.stop().unwrap();
    });

    group.bench_function("async_writer_to_file", |b| {
        let dir = tempdir().unwrap();
        let basename = dir.path().join("bench");
        let writer = Arc::new(
            AsyncWriter::new(basename.to_str().unwrap(), 500 * 1000 * 1000)
                .with_flush_interval(Duration::from_millis(500)),
        );
        writer.start().unwrap();
        let dispatch = Dispatch::new();
        AsyncWriter::install(&writer, &dispatch);

        b.iter(|| {
            for i in 0..RECORDS_PER_ITER {
                log_to!(&dispatch, Severity::Info, "Test perf: iteration=", i, " active=", true);
            }
        });
        writer.stop().unwrap();
        println!("dropped buffers: {}", writer.dropped_buffers());
    });

    group.bench_function("log4rs_to_file", |b| {
        let dir = tempdir().unwrap();
        let log_file = dir.path().join("log4rs.log");
        setup_log4rs(log_file.to_str().unwrap());

        b.iter(|| {
            for i in 0..RECORDS_PER_ITER {
                info!("Test perf: iteration={} active={}", i, true);
            }
        });
    });

    group.bench_function("tracing_non_blocking_to_file", |b| {
        let dir = tempdir().unwrap();
        let appender = tracing_appender::rolling::never(dir.path(), "tracing.log");
        let (non_blocking, _guard) = tracing_appender::non_blocking(appender);
        let subscriber = tracing_subscriber::fmt()
            .with_writer(non_blocking)
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            b.iter(|| {
                for i in 0..RECORDS_PER_ITER {
                    tracing::info!("Test perf: iteration={} active={}", i, true);
                }
            });
        });
    });

    group.finish();
}

criterion_group!(benches, bench_formatting, bench_pipeline);
criterion_main!(benches);
