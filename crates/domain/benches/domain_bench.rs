use common::OwnerId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{BatchItem, LinkService, OriginalUrl, short_code_for};
use url_store::InMemoryUrlStore;

fn bench_short_code(c: &mut Criterion) {
    c.bench_function("domain/short_code_for", |b| {
        b.iter(|| short_code_for("https://example.com/some/long/path?with=query&and=more"));
    });
}

fn bench_parse_url(c: &mut Criterion) {
    c.bench_function("domain/parse_url", |b| {
        b.iter(|| OriginalUrl::parse("  https://example.com:8443/path?q=1  ").unwrap());
    });
}

fn bench_shorten(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let owner = OwnerId::new("bench");

    c.bench_function("domain/shorten", |b| {
        b.iter(|| {
            rt.block_on(async {
                let service = LinkService::new(InMemoryUrlStore::new());
                service
                    .shorten(&owner, "https://example.com/bench")
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_shorten_batch_100(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let owner = OwnerId::new("bench");

    c.bench_function("domain/shorten_batch_100", |b| {
        b.iter(|| {
            rt.block_on(async {
                let service = LinkService::new(InMemoryUrlStore::new());
                let items = (0..100)
                    .map(|i| BatchItem {
                        correlation_id: Some(i.to_string()),
                        original_url: format!("https://example.com/{i}"),
                    })
                    .collect();
                service.shorten_batch(&owner, items).await.unwrap();
            });
        });
    });
}

fn bench_resolve(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = LinkService::new(InMemoryUrlStore::new());
    let code = rt
        .block_on(service.shorten(&OwnerId::new("bench"), "https://example.com/resolve"))
        .unwrap()
        .code;

    c.bench_function("domain/resolve", |b| {
        b.iter(|| {
            rt.block_on(async {
                service.resolve(&code).await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_short_code,
    bench_parse_url,
    bench_shorten,
    bench_shorten_batch_100,
    bench_resolve
);
criterion_main!(benches);
