// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for projection parsing and payload mapping in the
// multicontact-core crate.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use multicontact_core::{
    Contact, ContactField, ContactId, ContactName, ContactPayload, LabeledValue, Projection,
};

/// A contact with a realistic number of multi-valued entries.
fn sample_contact(i: usize) -> Contact {
    Contact {
        id: ContactId::new(format!("contact-{i}")),
        name: ContactName {
            given_name: Some(format!("Given{i}")),
            family_name: Some(format!("Family{i}")),
            ..Default::default()
        },
        phones: (0..3).map(|n| LabeledValue::new(format!("+1 555 01{n:02}"))).collect(),
        emails: (0..2).map(|n| LabeledValue::new(format!("user{i}.{n}@example.org"))).collect(),
        ..Default::default()
    }
}

/// Map an address book through the unrestricted and a narrow projection.
///
/// Sizes: 10, 1 000, 10 000 contacts, from a fresh device up to a large
/// synced address book.
fn bench_project_address_book(c: &mut Criterion) {
    let narrow = Projection::of([ContactField::ContactId, ContactField::Phones]);
    let all = Projection::all();

    let mut group = c.benchmark_group("payload_project");
    for size in [10usize, 1_000, 10_000] {
        let book: Vec<Contact> = (0..size).map(sample_contact).collect();

        group.bench_with_input(BenchmarkId::new("all_fields", size), &book, |b, book| {
            b.iter(|| {
                let out: Vec<_> = book
                    .iter()
                    .map(|c| ContactPayload::project(c, &all).to_json())
                    .collect();
                black_box(out);
            });
        });

        group.bench_with_input(BenchmarkId::new("id_and_phones", size), &book, |b, book| {
            b.iter(|| {
                let out: Vec<_> = book
                    .iter()
                    .map(|c| ContactPayload::project(c, &narrow).to_json())
                    .collect();
                black_box(out);
            });
        });
    }
    group.finish();
}

/// Parse a typical projection argument.
fn bench_parse_projection(c: &mut Criterion) {
    let arg = serde_json::json!({ "name": true, "phones": true, "emails": true, "image": true });
    c.bench_function("projection_from_argument", |b| {
        b.iter(|| Projection::from_argument(black_box(Some(&arg))).expect("valid projection"));
    });
}

criterion_group!(benches, bench_project_address_book, bench_parse_projection);
criterion_main!(benches);
