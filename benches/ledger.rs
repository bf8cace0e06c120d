//! Ledger and batch-check throughput for banquet-sized tables.
//!
//! Run with: `cargo bench --bench ledger`

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use uuid::Uuid;

use guest_seating::attendance::AttendanceSummary;
use guest_seating::models::{Guest, Honorific, ManualOverride, Rsvp, Table};
use guest_seating::seating::{check_batch, SeatingLedger, SeatingPolicy};

fn guests(n: usize) -> Vec<Guest> {
    let now = Utc::now();
    (0..n as i64)
        .map(|id| Guest {
            id,
            event_id: 1,
            unique_id: Uuid::new_v4(),
            name: format!("Guest {id}"),
            honorific: if id % 3 == 0 { Honorific::Family } else { Honorific::Mr },
            email: None,
            phone_number: None,
            invitation_method: None,
            max_attendees: 4,
            // каждый пятый гость отмечен хозяином вручную
            manual_override: (id % 5 == 0).then_some(ManualOverride {
                attending: true,
                count: Some(2),
            }),
            rsvp: Some(Rsvp {
                guest_id: id,
                attending: Some(true),
                number_attending: Some((id % 4 + 1) as i32),
                meal_preference: None,
                message: None,
                submitted_at: now,
                updated_at: now,
            }),
        })
        .collect()
}

fn table(capacity: i32) -> Table {
    Table {
        id: 1,
        event_id: 1,
        name: "Banquet".to_string(),
        capacity,
    }
}

fn benchmark_ledger(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger");

    for size in [8usize, 64, 512] {
        let seated = guests(size);
        let table = table(size as i32 * 4);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("build", size), &seated, |b, seated| {
            b.iter(|| black_box(SeatingLedger::build(&table, seated)));
        });

        group.bench_with_input(BenchmarkId::new("summary", size), &seated, |b, seated| {
            b.iter(|| black_box(AttendanceSummary::from_guests(seated)));
        });
    }

    group.finish();
}

fn benchmark_check_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("check_batch");
    let policy = SeatingPolicy::default();
    let table = table(2_000);
    let ledger = SeatingLedger::build(&table, &guests(100));

    for size in [1usize, 10, 100] {
        let batch = guests(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &batch, |b, batch| {
            b.iter(|| black_box(check_batch(&policy, &table, &ledger, batch, &[])));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_ledger, benchmark_check_batch);
criterion_main!(benches);
