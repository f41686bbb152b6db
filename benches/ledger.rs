use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rust_decimal_macros::dec;
use snowledger::{Account, Cause, ContextSet, Currency, Economy};

/// Builds an economy with `accounts` virtual accounts.
///
/// Uses a capped, non-negative currency so every mutation runs both checks.
fn setup(accounts: usize) -> (Economy, Vec<Arc<Account>>, Currency) {
    let economy = Economy::new();
    let gems = Currency::new("gems").with_maximum_balance(dec!(1000000000));
    economy.register_currency(Currency::snowballs()).unwrap();
    economy.register_currency(gems.clone()).unwrap();
    let accounts = (0..accounts)
        .map(|i| economy.create_virtual_account(&format!("account-{i}")).unwrap())
        .collect();
    (economy, accounts, gems)
}

fn bench_deposit_withdraw(c: &mut Criterion) {
    let mut group = c.benchmark_group("deposit_withdraw");
    let cause = Cause::of("bench");
    let contexts = ContextSet::empty();

    for count in [10_000u32, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let (_economy, accounts, gems) = setup(1);
                let account = &accounts[0];
                // deposit 100, deposit 50, withdraw 30 (repeating)
                for step in 0..count {
                    let result = match step % 3 {
                        0 => account.deposit(&gems, dec!(100), &cause, &contexts),
                        1 => account.deposit(&gems, dec!(50), &cause, &contexts),
                        _ => account.withdraw(&gems, dec!(30), &cause, &contexts),
                    };
                    black_box(result);
                }
            });
        });
    }

    group.finish();
}

fn bench_contexts(c: &mut Criterion) {
    let mut group = c.benchmark_group("contexts");
    let cause = Cause::of("bench");
    let worlds: Vec<ContextSet> = (0..64)
        .map(|i| ContextSet::empty().with("world", format!("world-{i}")).with("region", "spawn"))
        .collect();

    group.bench_function("64_partitions_10k", |b| {
        b.iter(|| {
            let (_economy, accounts, gems) = setup(1);
            for step in 0..10_000usize {
                let contexts = &worlds[step % worlds.len()];
                black_box(accounts[0].deposit(&gems, dec!(1), &cause, contexts));
            }
        });
    });

    group.finish();
}

fn bench_transfers(c: &mut Criterion) {
    let mut group = c.benchmark_group("transfers");
    let cause = Cause::of("bench");
    let contexts = ContextSet::empty();

    for accounts in [10usize, 1_000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(accounts),
            &accounts,
            |b, &count| {
                b.iter(|| {
                    let (_economy, accounts, gems) = setup(count);
                    for account in &accounts {
                        account.deposit(&gems, dec!(1000), &cause, &contexts);
                    }
                    for step in 0..10_000usize {
                        let from = &accounts[step % count];
                        let to = &accounts[(step * 7 + 1) % count];
                        black_box(from.transfer(to, &gems, dec!(3), &cause, &contexts));
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_deposit_withdraw, bench_contexts, bench_transfers);
criterion_main!(benches);
