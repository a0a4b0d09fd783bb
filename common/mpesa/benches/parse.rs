use criterion::{criterion_group, criterion_main, Criterion, black_box};
use common_money::Money;
use common_mpesa::{parse, PaymentVerifier};

const MESSAGES: &[&str] = &[
    "QK12AB3CD4 Confirmed. Ksh1,000.00 sent to CLICKSURVEY on 12/5/24 at 3:04 PM. New M-PESA balance is Ksh2,340.50.",
    "Confirmed. Ksh 500 paid. Paybill: CLICKSURVEY\nAccount: 0712345678",
    "Ksh 250 Till Number: CLICK SURVEY, transaction cost Ksh0.00",
    "not a payment message at all",
];

fn bench_parse(c: &mut Criterion) {
    c.bench_function("mpesa_parse", |b| {
        b.iter(|| {
            for m in MESSAGES { black_box(parse(black_box(m))); }
        });
    });
}

fn bench_verify(c: &mut Criterion) {
    let verifier = PaymentVerifier::new("CLICKSURVEY");
    let price = Some(Money::from_cents(50_000));
    c.bench_function("mpesa_verify_message", |b| {
        b.iter(|| {
            for m in MESSAGES { black_box(verifier.verify_message(black_box(m), price)); }
        });
    });
}

criterion_group!(benches, bench_parse, bench_verify);
criterion_main!(benches);
