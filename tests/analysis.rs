//! End-to-end tests of the analysis pipeline, its cache and the comparator

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    CountingEnrichment, FailingCompletion, JOHANNESBURG, ScriptedCompletion, service_with,
    service_with_towers, settings, tower,
};
use towerintel::analysis::recommendations::fallback_recommendations;
use towerintel::analysis::risk::{self, LOW_COVERAGE_RISK};
use towerintel::analysis::scoring;
use towerintel::{AnalysisRequest, LocationInput, RadioType};

const URBAN_ADDRESS: &str = "Johannesburg Central, Johannesburg, 2001, South Africa";

fn johannesburg_request() -> AnalysisRequest {
    AnalysisRequest::new(JOHANNESBURG.0, JOHANNESBURG.1, 5000.0).unwrap()
}

#[tokio::test]
async fn test_johannesburg_analysis_with_failing_completion() {
    let enrichment = Arc::new(CountingEnrichment::new(10, Some(URBAN_ADDRESS)));
    let service = service_with(enrichment.clone(), Arc::new(FailingCompletion));

    let analysis = service.analyze(johannesburg_request()).await.unwrap();

    assert_eq!(analysis.nearby_towers, 3);
    assert_eq!(analysis.recommendations, fallback_recommendations());
    assert_eq!(analysis.location.address.as_deref(), Some(URBAN_ADDRESS));

    let factors = analysis.factors;
    assert!((factors.fiber_proximity - 0.5).abs() < 1e-9);
    assert!((factors.population_density - 10.0 / 15.0).abs() < 1e-9);
    // 10/10 places, boosted for an urban address, then clamped
    assert!((factors.business_potential - 1.0).abs() < 1e-9);
    assert!((factors.signal_strength - (120.0 - 235.0 / 3.0) / 60.0).abs() < 1e-9);
    assert!(factors.cell_coverage > 0.0 && factors.cell_coverage < 0.01);

    assert!((analysis.score - scoring::score(&factors)).abs() < 1e-12);
    assert!(analysis.score > 0.6 && analysis.score < 0.62);
    assert_eq!(analysis.risks, vec![LOW_COVERAGE_RISK.to_string()]);
    assert_eq!(
        analysis.estimated_revenue,
        risk::estimate_revenue(analysis.score, &factors)
    );

    assert_eq!(enrichment.nearby_calls(), 3);
    assert_eq!(enrichment.geocode_calls(), 1);
}

#[tokio::test]
async fn test_completion_recommendations_are_used_when_valid() {
    let enrichment = Arc::new(CountingEnrichment::new(5, None));
    let completion = Arc::new(ScriptedCompletion::new(
        r#"{"recommendations": ["Partner with the local fiber operator", "Target the business district"]}"#,
    ));
    let service = service_with(enrichment, completion.clone());

    let analysis = service.analyze(johannesburg_request()).await.unwrap();

    assert_eq!(
        analysis.recommendations,
        vec![
            "Partner with the local fiber operator".to_string(),
            "Target the business district".to_string()
        ]
    );
    assert_eq!(completion.calls(), 1);
}

#[tokio::test]
async fn test_unparseable_completion_falls_back() {
    let enrichment = Arc::new(CountingEnrichment::new(5, None));
    let completion = Arc::new(ScriptedCompletion::new("Build more towers, obviously."));
    let service = service_with(enrichment, completion);

    let analysis = service.analyze(johannesburg_request()).await.unwrap();

    assert_eq!(analysis.recommendations, fallback_recommendations());
}

#[tokio::test]
async fn test_empty_area_is_flagged() {
    let enrichment = Arc::new(CountingEnrichment::new(0, None));
    let service = service_with(enrichment, Arc::new(FailingCompletion));

    let request = AnalysisRequest::new(-30.0, 22.0, 5000.0).unwrap();
    let analysis = service.analyze(request).await.unwrap();

    assert_eq!(analysis.nearby_towers, 0);
    assert_eq!(analysis.factors.cell_coverage, 0.0);
    assert!((analysis.factors.signal_strength - 0.1).abs() < 1e-9);
    assert!(analysis.risks.iter().any(|r| r.contains("No existing towers")));
    assert!(analysis.risks.iter().any(|r| r.contains("high investment risk")));
    assert_eq!(analysis.estimated_revenue, 0);
}

#[tokio::test(start_paused = true)]
async fn test_cached_analysis_is_reused_within_ttl() {
    let enrichment = Arc::new(CountingEnrichment::new(8, Some(URBAN_ADDRESS)));
    let service = service_with(enrichment.clone(), Arc::new(FailingCompletion));

    let first = service.analyze(johannesburg_request()).await.unwrap();
    let calls_after_first = enrichment.total_calls();
    assert_eq!(calls_after_first, 4);

    tokio::time::advance(Duration::from_secs(299)).await;
    let second = service.analyze(johannesburg_request()).await.unwrap();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert_eq!(enrichment.total_calls(), calls_after_first);
    assert_eq!(service.cached_analyses(), 1);

    tokio::time::advance(Duration::from_secs(2)).await;
    service.analyze(johannesburg_request()).await.unwrap();

    assert_eq!(enrichment.total_calls(), 2 * calls_after_first);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_misses_run_one_pipeline() {
    let enrichment =
        Arc::new(CountingEnrichment::new(8, None).with_latency(Duration::from_millis(200)));
    let service = service_with(enrichment.clone(), Arc::new(FailingCompletion));

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.analyze(johannesburg_request()).await })
        })
        .collect();

    let mut scores = Vec::new();
    for handle in handles {
        scores.push(handle.await.unwrap().unwrap().score);
    }

    assert!(scores.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(enrichment.nearby_calls(), 3);
    assert_eq!(enrichment.geocode_calls(), 1);
}

#[tokio::test]
async fn test_invalidate_all_forces_recompute() {
    let enrichment = Arc::new(CountingEnrichment::new(3, None));
    let service = service_with(enrichment.clone(), Arc::new(FailingCompletion));

    service.analyze(johannesburg_request()).await.unwrap();
    service.invalidate_all();
    service.analyze(johannesburg_request()).await.unwrap();

    assert_eq!(enrichment.total_calls(), 8);
}

#[tokio::test]
async fn test_compare_ranks_by_score_and_reports_failures() {
    let enrichment = Arc::new(CountingEnrichment::new(10, None));
    let service = service_with(enrichment, Arc::new(FailingCompletion));

    let locations = vec![
        LocationInput {
            latitude: -30.0,
            longitude: 22.0,
            name: Some("Karoo".to_string()),
        },
        LocationInput {
            latitude: 95.0,
            longitude: 22.0,
            name: Some("Nowhere".to_string()),
        },
        LocationInput {
            latitude: JOHANNESBURG.0,
            longitude: JOHANNESBURG.1,
            name: None,
        },
    ];

    let report = service.compare(locations, Some(5000.0)).await.unwrap();

    let names: Vec<&str> = report.ranked.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Location -26.2041, 28.0473", "Karoo"]);
    assert_eq!(report.ranked[0].rank, 1);
    assert_eq!(report.ranked[0].input_index, 2);
    assert!(report.ranked[0].analysis.score > report.ranked[1].analysis.score);

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].input_index, 1);
    assert_eq!(report.failures[0].name, "Nowhere");
}

#[tokio::test]
async fn test_compare_keeps_input_order_for_equal_scores() {
    let enrichment = Arc::new(CountingEnrichment::new(10, None));
    let service = service_with(enrichment.clone(), Arc::new(FailingCompletion));

    let locations: Vec<LocationInput> = ["first", "second", "third"]
        .into_iter()
        .map(|name| LocationInput {
            latitude: JOHANNESBURG.0,
            longitude: JOHANNESBURG.1,
            name: Some(name.to_string()),
        })
        .collect();

    let report = service.compare(locations, None).await.unwrap();

    let names: Vec<&str> = report.ranked.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["first", "second", "third"]);
    assert!(report.failures.is_empty());
    // One shared cache key, so one pipeline
    assert_eq!(enrichment.total_calls(), 4);
}

#[tokio::test]
async fn test_compare_rejects_empty_list() {
    let enrichment = Arc::new(CountingEnrichment::new(1, None));
    let service = service_with(enrichment, Arc::new(FailingCompletion));

    let err = service.compare(Vec::new(), None).await.unwrap_err();
    assert!(matches!(err, towerintel::TowerIntelError::Validation { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_slow_enrichment_leaves_recommendations_no_time() {
    let timeout = settings().request_timeout;
    let enrichment = Arc::new(
        CountingEnrichment::new(5, None).with_latency(timeout - Duration::from_millis(100)),
    );
    let completion = Arc::new(
        ScriptedCompletion::new(r#"{"recommendations": ["slow but valid"]}"#)
            .with_latency(Duration::from_secs(5)),
    );
    let service = service_with(enrichment, completion);

    let started = tokio::time::Instant::now();
    let analysis = service.analyze(johannesburg_request()).await.unwrap();

    assert_eq!(analysis.recommendations, fallback_recommendations());
    assert!(started.elapsed() <= timeout, "took {:?}", started.elapsed());
}

#[tokio::test(start_paused = true)]
async fn test_enrichment_past_the_deadline_times_out() {
    let timeout = settings().request_timeout;
    let enrichment =
        Arc::new(CountingEnrichment::new(5, None).with_latency(timeout + Duration::from_secs(1)));
    let service = service_with(enrichment, Arc::new(FailingCompletion));

    let err = service.analyze(johannesburg_request()).await.unwrap_err();
    assert!(matches!(err, towerintel::TowerIntelError::Timeout { .. }), "{err:?}");
}

#[tokio::test]
async fn test_tower_just_inside_radius_along_meridian_is_counted() {
    // 4998 m north of the centre by haversine
    let towers = vec![tower(1, RadioType::Lte, 0.04495, 0.0, 1000.0, -70.0)];
    let service = service_with_towers(
        towers,
        Arc::new(CountingEnrichment::new(1, None)),
        Arc::new(FailingCompletion),
    );

    let analysis = service
        .analyze(AnalysisRequest::new(0.0, 0.0, 5000.0).unwrap())
        .await
        .unwrap();
    assert_eq!(analysis.nearby_towers, 1);
}

#[tokio::test]
async fn test_towers_across_the_antimeridian_are_counted() {
    let towers = vec![
        tower(1, RadioType::Lte, 0.0, -179.99, 1000.0, -70.0),
        tower(2, RadioType::Gsm, 0.0, 179.98, 1000.0, -80.0),
    ];
    let service = service_with_towers(
        towers,
        Arc::new(CountingEnrichment::new(1, None)),
        Arc::new(FailingCompletion),
    );

    let analysis = service
        .analyze(AnalysisRequest::new(0.0, 179.99, 5000.0).unwrap())
        .await
        .unwrap();
    assert_eq!(analysis.nearby_towers, 2);
}

#[tokio::test(start_paused = true)]
async fn test_compare_bounds_pipelines_in_flight() {
    let enrichment =
        Arc::new(CountingEnrichment::new(4, None).with_latency(Duration::from_millis(250)));
    let service = service_with(enrichment.clone(), Arc::new(FailingCompletion));
    let limit = service.settings().max_concurrency;

    let locations: Vec<LocationInput> = (0..limit * 3)
        .map(|i| LocationInput {
            latitude: -26.0 - i as f64 * 0.1,
            longitude: 28.0,
            name: Some(format!("site {i}")),
        })
        .collect();

    let report = service.compare(locations, None).await.unwrap();

    assert_eq!(report.ranked.len(), limit * 3);
    assert_eq!(enrichment.geocode_calls(), limit * 3);
    assert!(enrichment.peak_geocodes() > 1, "pipelines never overlapped");
    assert!(
        enrichment.peak_geocodes() <= limit,
        "peak {} exceeds limit {limit}",
        enrichment.peak_geocodes()
    );
}
