use criterion::{Criterion, black_box, criterion_group, criterion_main};
use domain::{
    Currency, DomainEvent, Email, Money, Product, ProductDetails, ProductId, User, UserId,
};

fn sample_product(stock: i64) -> Product {
    Product::new(
        ProductId::generate(),
        ProductDetails {
            name: "Laptop Dell Inspiron".to_string(),
            description: "Laptop para uso institucional".to_string(),
            price: Money::new(250_000, Currency::Pen).unwrap(),
            category: Some("tecnologia".to_string()),
        },
        stock,
    )
    .unwrap()
}

fn bench_email_parse(c: &mut Criterion) {
    c.bench_function("domain/email_parse", |b| {
        b.iter(|| Email::parse(black_box("  Maria.Gonzalez@MEF.gob.pe ")).unwrap());
    });
}

fn bench_money(c: &mut Criterion) {
    let price = Money::new(1_999_999, Currency::Pen).unwrap();
    let mut group = c.benchmark_group("domain/money");

    group.bench_function("add", |b| {
        b.iter(|| black_box(price).add(black_box(price)).unwrap());
    });

    group.bench_function("multiply", |b| {
        b.iter(|| black_box(price).multiply(black_box(7.0)).unwrap());
    });

    group.bench_function("formatted", |b| {
        b.iter(|| black_box(price).formatted());
    });

    group.finish();
}

fn bench_reserve_stock(c: &mut Criterion) {
    c.bench_function("domain/reserve_stock", |b| {
        b.iter_batched(
            || sample_product(1_000),
            |mut product| {
                for _ in 0..100 {
                    product.reserve_stock(black_box(5)).unwrap();
                }
                product
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

fn bench_event_serialization(c: &mut Criterion) {
    let user = User::register(
        UserId::generate(),
        Email::parse("bench@mef.gob.pe").unwrap(),
        "Bench User",
    )
    .unwrap();
    let event = DomainEvent::user_activated(&user, "admin", Some("benchmark".to_string()));

    c.bench_function("domain/event_to_json", |b| {
        b.iter(|| serde_json::to_vec(black_box(&event)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_email_parse,
    bench_money,
    bench_reserve_stock,
    bench_event_serialization
);
criterion_main!(benches);
