use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use chrono::NaiveDate;

use matchform::batch::analyze_teams;
use matchform::compare::compare;
use matchform::csv_source::read_matches;
use matchform::form::compute_stats;
use matchform::model::MatchRecord;

const TEAMS: [&str; 8] = [
    "Galatasaray",
    "Fenerbahçe",
    "Beşiktaş",
    "Trabzonspor",
    "Başakşehir",
    "Kasımpaşa",
    "Sivasspor",
    "Konyaspor",
];

/// A double round robin with deterministic pseudo-random scores.
fn season() -> Vec<MatchRecord> {
    let start = NaiveDate::from_ymd_opt(2024, 8, 1).expect("valid date");
    let mut out = Vec::new();
    let mut seed = 17u32;
    let mut day = 0u64;
    for home in TEAMS {
        for away in TEAMS {
            if home == away {
                continue;
            }
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let hg = ((seed >> 16) % 5) as i32;
            let ag = ((seed >> 8) % 4) as i32;
            out.push(MatchRecord::new(
                Some(start + chrono::Days::new(day)),
                home,
                away,
                hg,
                ag,
            ));
            day += 1;
        }
    }
    out
}

fn season_csv(rows: &[MatchRecord]) -> String {
    let mut out = String::from("date,home_team,away_team,home_goals,away_goals\n");
    for m in rows {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            m.date.map(|d| d.to_string()).unwrap_or_default(),
            m.home_team,
            m.away_team,
            m.home_goals.unwrap_or_default(),
            m.away_goals.unwrap_or_default()
        ));
    }
    out
}

fn bench_compute_stats(c: &mut Criterion) {
    let all = season();
    let own = all
        .iter()
        .filter(|m| m.involves("Galatasaray"))
        .cloned()
        .collect::<Vec<_>>();
    c.bench_function("compute_stats", |b| {
        b.iter(|| {
            let stats = compute_stats(black_box("Galatasaray"), black_box(&own), 10).unwrap();
            black_box(stats.form_points);
        })
    });
}

fn bench_compare(c: &mut Criterion) {
    let all = season();
    let pick = |team: &str| {
        let own = all
            .iter()
            .filter(|m| m.involves(team))
            .cloned()
            .collect::<Vec<_>>();
        compute_stats(team, &own, 10).unwrap()
    };
    let a = pick("Galatasaray");
    let b = pick("Fenerbahçe");
    c.bench_function("compare", |bench| {
        bench.iter(|| {
            let cmp = compare(black_box(&a), black_box(&b));
            black_box(cmp.confidence);
        })
    });
}

fn bench_form_table(c: &mut Criterion) {
    let all = season();
    let teams = TEAMS.iter().map(|t| t.to_string()).collect::<Vec<_>>();
    c.bench_function("form_table", |b| {
        b.iter(|| {
            let rows = analyze_teams(black_box(&all), black_box(&teams), 10);
            black_box(rows.len());
        })
    });
}

fn bench_csv_parse(c: &mut Criterion) {
    let raw = season_csv(&season());
    c.bench_function("csv_parse", |b| {
        b.iter(|| {
            let rows = read_matches(black_box(raw.as_bytes())).unwrap();
            black_box(rows.len());
        })
    });
}

criterion_group!(
    perf,
    bench_compute_stats,
    bench_compare,
    bench_form_table,
    bench_csv_parse
);
criterion_main!(perf);
