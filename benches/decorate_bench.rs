use criterion::{criterion_group, criterion_main, Criterion};

use teapot_decor::{DecorConfig, MemoryDocument, PageDecorator};

fn sample_page(sections: usize) -> String {
    let mut body = String::new();
    for i in 0..sections {
        body.push_str(&format!("<section><h2>Section {i}</h2><p>Paragraph {i}</p></section>"));
    }
    format!(
        "<html><head><title>Bench</title></head><body><a id=\"forkme_banner\">Fork</a>{}<footer class=\"inner\"><p class=\"copyright\">old</p></footer></body></html>",
        body
    )
}

fn bench_decorate(c: &mut Criterion) {
    let html = sample_page(200);
    let doc = MemoryDocument::parse(&html).expect("parse");
    let decorator = PageDecorator::new(&DecorConfig::default()).expect("config");

    c.bench_function("apply_decoration", |b| {
        b.iter(|| {
            let mut doc = doc.clone();
            decorator.apply_decoration(&mut doc).unwrap();
        })
    });

    c.bench_function("decorate_html", |b| {
        b.iter(|| teapot_decor::decorate_html(&html, &DecorConfig::default(), false).unwrap())
    });
}

fn bench_render_snapshot(c: &mut Criterion) {
    let mut doc = MemoryDocument::parse(&sample_page(200)).expect("parse");
    let decorator = PageDecorator::new(&DecorConfig::default()).expect("config");
    decorator.apply_decoration(&mut doc).unwrap();

    c.bench_function("render_text_snapshot", |b| {
        b.iter(|| teapot_decor::render_text_snapshot(&doc))
    });
}

criterion_group!(benches, bench_decorate, bench_render_snapshot);
criterion_main!(benches);
