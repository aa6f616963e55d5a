use std::fmt::Write as _;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use libconfig::{Parser, ParserPool, Scanner};

const APPLICATION: &str = r#"
version = "1.0";
application:
{
  window:
  {
    title = "My Application";
    size = { w = 640; h = 480; };
    pos = { x = 350; y = 250; };
  };
  list = ( ( "abc", 123, true ), 1.234, ( /* an empty list */) );
  books = ( { title  = "Treasure Island";
              author = "Robert Louis Stevenson";
              price  = 29.95;
              qty    = 5; },
            { title  = "Snow Crash";
              author = "Neal Stephenson";
              price  = 9.99;
              qty    = 8; } );
  misc:
  {
    pi = 3.141592654;
    bigint = 9223372036854775807L;
    columns = [ "Last Name", "First Name", "MI" ];
    bitmask = 0x1FC3;
  };
};
"#;

fn catalog(entries: usize) -> String {
    let mut out = String::from("catalog = (\n");
    for idx in 0..entries {
        let _ = writeln!(
            out,
            "  {{ id = {idx}; name = \"item {idx}\"; price = {}.5; flags = 0x{idx:X}; tags = [\"a\", \"b\"]; }},",
            idx % 97
        );
    }
    out.push_str(");\n");
    out
}

fn stream(documents: usize) -> String {
    let mut out = String::new();
    for idx in 0..documents {
        let _ = writeln!(out, "{{ seq = {idx}; ok = true; }}");
    }
    out
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    group.measurement_time(Duration::from_secs(5));

    group.throughput(Throughput::Bytes(APPLICATION.len() as u64));
    group.bench_function("application/reused_parser", |b| {
        let mut parser = Parser::new();
        b.iter(|| {
            let root = parser.parse(black_box(APPLICATION)).unwrap();
            black_box(root.get_int(&["application", "misc", "bitmask"]))
        })
    });
    group.bench_function("application/fresh_parser", |b| {
        b.iter(|| {
            let mut parser = Parser::new();
            let root = parser.parse(black_box(APPLICATION)).unwrap();
            black_box(root.get_int(&["application", "misc", "bitmask"]))
        })
    });
    group.bench_function("application/handy", |b| {
        b.iter(|| {
            black_box(libconfig::get_hex(
                black_box(APPLICATION.as_bytes()),
                &["application", "misc", "bitmask"],
            ))
        })
    });

    for entries in [100, 1_000] {
        let input = catalog(entries);
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("catalog", entries), &input, |b, input| {
            let pool = ParserPool::new();
            b.iter(|| {
                let mut parser = pool.acquire();
                let count = parser
                    .parse(black_box(input))
                    .ok()
                    .and_then(|root| root.get(&["catalog"]))
                    .and_then(|value| value.array())
                    .map_or(0, |items| items.len());
                pool.release(parser);
                black_box(count)
            })
        });
    }
    group.finish();
}

fn bench_scanner(c: &mut Criterion) {
    let input = stream(1_000);
    let mut group = c.benchmark_group("scanner");
    group.throughput(Throughput::Bytes(input.len() as u64));
    group.bench_function("groups", |b| {
        let mut scanner = Scanner::new();
        b.iter(|| {
            scanner.init(black_box(&input));
            let mut total = 0;
            while scanner.next() {
                total += scanner.value().map_or(0, |value| value.get_int(&["seq"]));
            }
            black_box(total)
        })
    });
    group.finish();
}

criterion_group!(benches, bench_parse, bench_scanner);
criterion_main!(benches);
