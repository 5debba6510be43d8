use std::fmt::Write as _;
use std::hint::black_box;
use std::time::Duration;

use criterion::{Criterion, criterion_group, criterion_main};
use danmaku_processor::{AssRenderOptionsBuilder, generate_ass, parse_bilibili};

fn synthesize_feed(count: usize) -> String {
    let mut feed = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<i>\n");
    for i in 0..count {
        let timestamp = (i % 600) as f64 * 0.35;
        let mode = match i % 10 {
            0 => 5,
            1 => 4,
            _ => 1,
        };
        let color = if i % 7 == 0 { 16_711_680 } else { 16_777_215 };
        writeln!(
            feed,
            r#"	<d p="{timestamp:.2},{mode},25,{color},1422201084,0,{i:08x},{i}">弹幕内容测试第{i}条</d>"#
        )
        .unwrap();
    }
    feed.push_str("</i>\n");
    feed
}

fn benchmark_conversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("Danmaku Conversion");

    group.measurement_time(Duration::from_secs(10));
    group.sample_size(100);

    let feed = synthesize_feed(5000);
    let options = AssRenderOptionsBuilder::default()
        .width(1920_u32)
        .height(1080_u32)
        .build()
        .expect("构造渲染选项失败");
    let comments = parse_bilibili(&feed, 25.0).expect("样本解析失败");

    group.bench_function("parse_5000_comments", |b| {
        b.iter(|| {
            let parsed = parse_bilibili(black_box(&feed), black_box(25.0)).expect("样本解析失败");

            black_box(parsed);
        });
    });

    group.bench_function("generate_5000_comments", |b| {
        b.iter(|| {
            let document =
                generate_ass(black_box(&comments), black_box(&options)).expect("样本渲染失败");

            black_box(document);
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_conversion);

criterion_main!(benches);
