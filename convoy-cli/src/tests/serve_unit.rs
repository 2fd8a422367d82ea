//! Focused unit tests covering serve configuration.

use super::*;
use convoy_core::{Coordinate, DEFAULT_MAX_ELEMENTS_PER_CALL, DEFAULT_TIME_BUDGET};
use convoy_data::routing::DEFAULT_BASE_URL;
use convoy_dispatch::{DEFAULT_RETENTION, DispatchConfig};
use ortho_config::MergeComposer;
use rstest::rstest;
use serde_json::json;
use std::time::Duration;

#[rstest]
fn defaults_serve_great_circle_distances_from_memory() {
    let config = ServeConfig::try_from(ServeArgs::default()).expect("defaults resolve");

    assert_eq!(config.bind.to_string(), DEFAULT_BIND);
    assert!(matches!(
        config.distance,
        DistanceSource::Haversine {
            max_elements_per_call: DEFAULT_MAX_ELEMENTS_PER_CALL
        }
    ));
    assert_eq!(config.backend, Backend::Memory);
    assert_eq!(config.dispatch, DispatchConfig::default());
    assert_eq!(config.dispatch.solve_time_budget, DEFAULT_TIME_BUDGET);
    assert_eq!(config.retention, DEFAULT_RETENTION);
}

#[rstest]
fn an_api_key_selects_the_default_distance_service() {
    let args = ServeArgs {
        api_key: Some("secret".to_owned()),
        max_elements_per_call: Some(25),
        ..ServeArgs::default()
    };

    let config = ServeConfig::try_from(args).expect("config resolves");
    match config.distance {
        DistanceSource::Http(http) => {
            assert_eq!(http.base_url, DEFAULT_BASE_URL);
            assert_eq!(http.api_key.as_deref(), Some("secret"));
            assert_eq!(http.max_elements_per_call, 25);
        }
        other => panic!("expected the HTTP provider, found {other:?}"),
    }
}

#[rstest]
fn a_distance_url_selects_that_service_without_a_key() {
    let args = ServeArgs {
        distance_url: Some("http://localhost:9000/matrix".to_owned()),
        ..ServeArgs::default()
    };

    let config = ServeConfig::try_from(args).expect("config resolves");
    match config.distance {
        DistanceSource::Http(http) => {
            assert_eq!(http.base_url, "http://localhost:9000/matrix");
            assert_eq!(http.api_key, None);
        }
        other => panic!("expected the HTTP provider, found {other:?}"),
    }
}

#[rstest]
#[case::hostname(
    ServeArgs { bind: Some("localhost:80".to_owned()), ..ServeArgs::default() },
    ARG_BIND
)]
#[case::no_workers(ServeArgs { workers: Some(0), ..ServeArgs::default() }, ARG_WORKERS)]
#[case::busy_polling(
    ServeArgs { poll_interval_ms: Some(0), ..ServeArgs::default() },
    ARG_POLL_INTERVAL_MS
)]
#[case::no_wait(ServeArgs { max_wait_ms: Some(0), ..ServeArgs::default() }, ARG_MAX_WAIT_MS)]
#[case::no_budget(
    ServeArgs { time_budget_secs: Some(0), ..ServeArgs::default() },
    ARG_TIME_BUDGET_SECS
)]
#[case::no_elements(
    ServeArgs { max_elements_per_call: Some(0), ..ServeArgs::default() },
    ARG_MAX_ELEMENTS_PER_CALL
)]
fn unusable_values_are_rejected(#[case] args: ServeArgs, #[case] expected: &'static str) {
    let err = ServeConfig::try_from(args).expect_err("value should be rejected");
    match err {
        CliError::InvalidArgument { field, .. } => assert_eq!(field, expected),
        other => panic!("expected InvalidArgument, found {other:?}"),
    }
}

#[cfg(not(feature = "redis"))]
#[rstest]
fn a_redis_url_needs_the_redis_feature() {
    let args = ServeArgs {
        redis_url: Some("redis://localhost".to_owned()),
        ..ServeArgs::default()
    };

    let err = ServeConfig::try_from(args).expect_err("feature is disabled");
    assert!(matches!(err, CliError::MissingFeature { feature: "redis", .. }));
}

#[cfg(feature = "redis")]
#[rstest]
fn a_shared_queue_may_run_without_local_workers() {
    let args = ServeArgs {
        redis_url: Some("redis://localhost".to_owned()),
        workers: Some(0),
        ..ServeArgs::default()
    };

    let config = ServeConfig::try_from(args).expect("config resolves");
    assert_eq!(
        config.backend,
        Backend::Redis {
            url: "redis://localhost".to_owned()
        }
    );
    assert_eq!(config.dispatch.workers, 0);
}

#[rstest]
fn merge_layers_honours_precedence() {
    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "bind": "0.0.0.0:9000",
            "workers": 2,
            "max_wait_ms": 4000,
        }),
        None,
    );
    composer.push_environment(json!({
        "workers": 6,
        "poll_interval_ms": 250,
    }));
    composer.push_cli(json!({
        "max_wait_ms": 1500,
    }));

    let config = serve::config_from_layers_for_test(composer.layers()).expect("merged config");
    assert_eq!(config.bind.to_string(), "0.0.0.0:9000");
    assert_eq!(config.dispatch.workers, 6);
    assert_eq!(config.dispatch.poll_interval, Duration::from_millis(250));
    assert_eq!(config.dispatch.max_wait, Duration::from_millis(1500));
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "workers": "many" }));

    let err = serve::config_from_layers_for_test(composer.layers())
        .expect_err("invalid layer should fail");
    assert!(matches!(err, CliError::Configuration(_)));
}

#[rstest]
fn great_circle_builder_answers_without_a_service() {
    let distance = DistanceSource::Haversine {
        max_elements_per_call: 4,
    };
    let Ok(builder) = distance.matrix_builder() else {
        panic!("great-circle builder should always build");
    };

    let matrix = builder
        .build(&[
            Coordinate::new(35.05, -89.85),
            Coordinate::new(35.15, -90.05),
            Coordinate::new(35.10, -89.93),
        ])
        .expect("great-circle distances always resolve");

    assert_eq!(matrix.len(), 3);
    assert!(matrix.iter().enumerate().all(|(i, row)| row.get(i) == Some(&0)));
    assert_eq!(
        matrix.first().and_then(|row| row.get(1)),
        matrix.get(1).and_then(|row| row.first())
    );
}

#[rstest]
fn an_unparseable_distance_url_fails_to_build() {
    let distance = DistanceSource::Http(convoy_data::routing::HttpDistanceProviderConfig::new(
        "not a url",
    ));

    match distance.matrix_builder() {
        Err(CliError::BuildDistanceProvider { base_url, .. }) => assert_eq!(base_url, "not a url"),
        Err(other) => panic!("expected BuildDistanceProvider, found {other:?}"),
        Ok(_) => panic!("an invalid URL should not build"),
    }
}
