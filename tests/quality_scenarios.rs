use chrono::{DateTime, Duration, TimeZone, Utc};

use data_quality_monitor::execution::{EngineOptions, QualityEngine, evaluate};
use data_quality_monitor::quality::{
    AccuracyAnalyzer, CompletenessAnalyzer, ConsistencyAnalyzer, Dimension, IssueKind, QualityWeights, Severity,
    TimelinessAnalyzer,
};
use data_quality_monitor::rules::{ColumnRule, FreshnessRule, OutlierRule, QualityRuleset};
use data_quality_monitor::types::{Column, DataType, Dataset, Value};

const CATEGORIES: [&str; 3] = ["Electronics", "Clothing", "Food"];

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

/// 100 products with two missing prices (rows 5 and 15), a negative price (row 30), a price
/// outlier (row 60) and an unknown category (row 70).
fn products() -> Dataset {
    let n: i64 = 100;
    let price = (0..n)
        .map(|i| match i {
            5 | 15 => Value::Missing,
            30 => Value::Float(-50.0),
            60 => Value::Float(99_999.99),
            _ => Value::Float(10.0 + (i % 40) as f64),
        })
        .collect();
    let category = (0..n)
        .map(|i| match i {
            70 => Value::String("Toys".to_string()),
            _ => Value::String(CATEGORIES[(i % 3) as usize].to_string()),
        })
        .collect();
    let start = now() - Duration::days(30);
    let last_updated = (0..n).map(|i| Value::Datetime(start + Duration::hours(i))).collect();

    Dataset::new(vec![
        Column::new("product_id", DataType::Integer, (1..=n).map(Value::Integer).collect()),
        Column::new("price", DataType::Float, price),
        Column::new("category", DataType::Categorical, category),
        Column::new("last_updated", DataType::Datetime, last_updated),
    ])
    .unwrap()
}

fn rules() -> QualityRuleset {
    QualityRuleset::new()
        .column("product_id", ColumnRule::new().unique())
        .column(
            "price",
            ColumnRule::new()
                .dtype(DataType::Float)
                .min(0.0)
                .outlier(OutlierRule::z_score(3.0)),
        )
        .column("category", ColumnRule::new().allowed_values(CATEGORIES))
        .column("last_updated", ColumnRule::new().freshness(FreshnessRule::no_future_dates()))
}

#[test]
fn two_nulls_in_a_hundred_rows_score_ninety_eight() {
    let score = CompletenessAnalyzer::new().evaluate(&products());
    assert_eq!(score.column_score("price"), Some(98.0));
    assert_eq!(score.column_score("product_id"), Some(100.0));

    let issue = score.issues.iter().find(|i| i.column == "price").unwrap();
    assert_eq!(issue.kind, IssueKind::NullValue);
    assert_eq!(issue.affected_indices, vec![5, 15]);
    assert_eq!(issue.severity, Severity::Info);
}

#[test]
fn negative_price_is_critical() {
    let score = AccuracyAnalyzer::new().evaluate(&products(), &rules()).unwrap();

    let negative: Vec<_> = score.issues_of(IssueKind::NegativeValue).collect();
    assert_eq!(negative.len(), 1);
    assert_eq!(negative[0].column, "price");
    assert_eq!(negative[0].affected_indices, vec![30]);
    assert_eq!(negative[0].severity, Severity::Critical);
}

#[test]
fn extreme_price_is_an_outlier() {
    let score = AccuracyAnalyzer::new().evaluate(&products(), &rules()).unwrap();

    let outliers: Vec<_> = score.issues_of(IssueKind::Outlier).collect();
    assert_eq!(outliers.len(), 1);
    assert_eq!(outliers[0].affected_indices, vec![60]);
    assert!(score.score < 100.0);
}

#[test]
fn unknown_category_is_flagged() {
    let score = ConsistencyAnalyzer::new().evaluate(&products(), &rules()).unwrap();

    let invalid: Vec<_> = score.issues_of(IssueKind::InvalidCategory).collect();
    assert_eq!(invalid.len(), 1);
    assert_eq!(invalid[0].affected_indices, vec![70]);
    assert_eq!(score.score, 99.0);
}

#[test]
fn empty_ruleset_only_completeness_reflects_data() {
    let report = evaluate(&products(), &QualityRuleset::new(), QualityWeights::default(), now()).unwrap();

    assert_eq!(report.score(Dimension::Accuracy), 100.0);
    assert_eq!(report.score(Dimension::Consistency), 100.0);
    assert_eq!(report.score(Dimension::Timeliness), 100.0);
    assert_eq!(report.score(Dimension::Completeness), (300.0 + 98.0) / 4.0);
    assert!(report.dimension(Dimension::Timeliness).no_rules_applied());
}

#[test]
fn equal_weights_composite_is_the_mean() {
    let report = evaluate(&products(), &rules(), QualityWeights::default(), now()).unwrap();

    let mean = Dimension::ALL.iter().map(|&d| report.score(d)).sum::<f64>() / 4.0;
    assert!((report.composite_score() - mean).abs() < 1e-9);
    assert!(report.passes(report.composite_score()));
    assert!(!report.passes(100.0));
}

#[test]
fn future_dates_depend_on_the_reference_instant() {
    let ds = products();
    let rules = rules();

    let fresh = TimelinessAnalyzer::new(now()).evaluate(&ds, &rules).unwrap();
    assert_eq!(fresh.score, 100.0);

    // Rows 0..=99 span 30 days back in hourly steps; moving "now" back flags the newest rows.
    let earlier = now() - Duration::days(30) + Duration::hours(89) + Duration::minutes(30);
    let stale = TimelinessAnalyzer::new(earlier).evaluate(&ds, &rules).unwrap();
    let future: Vec<_> = stale.issues_of(IssueKind::FutureDate).collect();
    assert_eq!(future[0].affected_indices, (90..100).collect::<Vec<_>>());
    assert_eq!(stale.score, 90.0);
}

#[test]
fn engine_runs_are_idempotent() {
    let ds = products();
    let engine = QualityEngine::new(EngineOptions {
        num_threads: Some(3),
        now: Some(now()),
        ..Default::default()
    })
    .unwrap();

    let first = engine.evaluate(&ds, &rules()).unwrap();
    let second = engine.evaluate(&ds, &rules()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.generated_at(), now());

    let sequential = evaluate(&ds, &rules(), QualityWeights::default(), now()).unwrap();
    assert_eq!(first, sequential);
}

#[test]
fn report_serializes_with_composite_score() {
    let report = evaluate(&products(), &rules(), QualityWeights::default(), now()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();

    assert!(json["composite_score"].is_number());
    assert!(json["dimension_scores"]["accuracy"]["issues"].is_array());
    assert_eq!(json["profile"]["row_count"], 100);
}
