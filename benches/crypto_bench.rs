use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ethlite::abi::{encode_call, Token};
use ethlite::{u256, PrivateKey, Transaction};

fn criterion_benchmark(c: &mut Criterion) {
    let key: PrivateKey = "c85ef7d79691fe79573b1a7064c19c1a9819ebdbd1faaab1a8ec92344438aaf4"
        .parse()
        .unwrap();
    let recipient = "0xd8da6bf26964af9d7eed9e03e53415d37aa96045".parse().unwrap();
    let tx = Transaction::new(
        u256!(0),
        u256!(3_000_000_000),
        u256!(21_000),
        Some(recipient),
        u256!(100),
        Vec::new(),
        1,
    )
    .unwrap();

    c.bench_function("derive address", |b| {
        b.iter(|| black_box(key.to_address()))
    });

    c.bench_function("signing hash", |b| {
        b.iter(|| black_box(tx.signing_hash()))
    });

    c.bench_function("sign transaction", |b| b.iter(|| black_box(tx.sign(&key))));

    c.bench_function("encode erc20 transfer", |b| {
        b.iter(|| {
            encode_call(
                "transfer(address,uint256)",
                &[
                    Token::Address(recipient),
                    Token::Uint(u256!(10_000_000_000_000_000_000)),
                ],
            )
            .unwrap()
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
