use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use tablemap::{matcher, similarity};

fn target_schema() -> Vec<String> {
    [
        "first_name",
        "last_name",
        "email",
        "phone_number",
        "date_of_birth",
        "street_address",
        "city",
        "state",
        "postal_code",
        "department",
        "job_title",
        "hire_date",
        "employee_id",
        "manager_id",
        "salary",
        "status",
        "ssn",
        "notes",
    ]
    .iter()
    .map(|name| (*name).to_string())
    .collect()
}

fn source_headers(noise: usize) -> Vec<String> {
    let mut headers: Vec<String> = [
        "fname",
        "lname",
        "email_address",
        "phone",
        "dob",
        "street_addr",
        "town",
        "province",
        "zip",
        "dept",
        "job",
        "start_date",
        "emp_no",
        "record_status",
    ]
    .iter()
    .map(|name| (*name).to_string())
    .collect();
    for index in 0..noise {
        headers.push(format!("extra_field_{index:02}"));
    }
    headers
}

fn bench_matching(c: &mut Criterion) {
    let targets = target_schema();
    let sources = source_headers(26);

    let mut group = c.benchmark_group("column_matching");

    group.bench_function("score_pair", |b| {
        b.iter(|| similarity::score(black_box("email_address"), black_box("email")));
    });

    group.bench_function("best_match_forty_sources", |b| {
        b.iter(|| similarity::best_match(black_box("date_of_birth"), &sources));
    });

    group.bench_function("match_all_targets", |b| {
        b.iter(|| matcher::match_columns(&targets, &sources, matcher::DEFAULT_THRESHOLD));
    });

    group.finish();
}

criterion_group!(benches, bench_matching);
criterion_main!(benches);
