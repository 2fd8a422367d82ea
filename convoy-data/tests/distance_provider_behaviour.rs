//! Behavioural tests for distance providers behind `DistanceMatrixBuilder`.
//!
//! The HTTP path is exercised through [`StubDistanceProvider`]; see
//! `http_distance_provider.rs` for tests against a live stub service.

use std::cell::RefCell;

use convoy_core::{
    Coordinate, DistanceMatrix, DistanceMatrixBuilder, DistanceMatrixError, DistanceProvider,
};
use convoy_data::routing::HaversineDistanceProvider;
use convoy_data::routing::test_support::StubDistanceProvider;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

/// Result cell holding the outcome of a matrix build.
type ResultCell = RefCell<Result<DistanceMatrix, DistanceMatrixError>>;

#[derive(Debug, Clone)]
enum ProviderChoice {
    Stub(StubDistanceProvider),
    GreatCircle(HaversineDistanceProvider),
}

impl DistanceProvider for ProviderChoice {
    fn distance_rows(
        &self,
        origins: &[Coordinate],
        destinations: &[Coordinate],
    ) -> Result<DistanceMatrix, DistanceMatrixError> {
        match self {
            Self::Stub(provider) => provider.distance_rows(origins, destinations),
            Self::GreatCircle(provider) => provider.distance_rows(origins, destinations),
        }
    }
}

#[fixture]
fn provider() -> RefCell<Option<ProviderChoice>> {
    RefCell::new(None)
}

#[fixture]
fn result() -> ResultCell {
    RefCell::new(Ok(Vec::new()))
}

fn three_stops() -> Vec<Coordinate> {
    vec![
        Coordinate::new(35.0527, -89.8502),
        Coordinate::new(35.1430, -90.0515),
        Coordinate::new(35.1096, -89.8554),
    ]
}

fn stubbed_matrix() -> DistanceMatrix {
    vec![vec![0, 20_101, 6_456], vec![20_310, 0, 18_022], vec![6_512, 17_950, 0]]
}

// --- Given steps ---

#[given("a distance service returning stubbed rows")]
fn service_ok(#[from(provider)] provider: &RefCell<Option<ProviderChoice>>) {
    *provider.borrow_mut() = Some(ProviderChoice::Stub(StubDistanceProvider::with_matrix(
        three_stops(),
        stubbed_matrix(),
    )));
}

#[given("the great-circle provider")]
fn great_circle(#[from(provider)] provider: &RefCell<Option<ProviderChoice>>) {
    *provider.borrow_mut() = Some(ProviderChoice::GreatCircle(
        HaversineDistanceProvider::default(),
    ));
}

#[given("a distance service that fails with a network error")]
fn service_network_error(#[from(provider)] provider: &RefCell<Option<ProviderChoice>>) {
    *provider.borrow_mut() = Some(ProviderChoice::Stub(StubDistanceProvider::with_error(
        DistanceMatrixError::NetworkError {
            url: "http://example.com/distancematrix/json".to_owned(),
            message: "connection refused".to_owned(),
        },
    )));
}

#[given("a distance service returning an error response")]
fn service_error(#[from(provider)] provider: &RefCell<Option<ProviderChoice>>) {
    *provider.borrow_mut() = Some(ProviderChoice::Stub(StubDistanceProvider::with_error(
        DistanceMatrixError::ServiceError {
            code: "OVER_QUERY_LIMIT".to_owned(),
            message: "You have exceeded your rate-limit for this API.".to_owned(),
        },
    )));
}

// --- When steps ---

#[when("I build a matrix for three stops")]
fn build_three(
    #[from(provider)] provider: &RefCell<Option<ProviderChoice>>,
    #[from(result)] result: &ResultCell,
) {
    let guard = provider.borrow();
    let chosen = guard.as_ref().expect("provider must be initialised");
    *result.borrow_mut() = DistanceMatrixBuilder::new(chosen).build(&three_stops());
}

#[when("I build a matrix for no stops")]
fn build_none(
    #[from(provider)] provider: &RefCell<Option<ProviderChoice>>,
    #[from(result)] result: &ResultCell,
) {
    let guard = provider.borrow();
    let chosen = guard.as_ref().expect("provider must be initialised");
    *result.borrow_mut() = DistanceMatrixBuilder::new(chosen).build(&[]);
}

// --- Then steps ---

#[then("a 3x3 matrix is returned")]
fn then_matrix(#[from(result)] result: &ResultCell) {
    let borrowed = result.borrow();
    let matrix = borrowed.as_ref().expect("expected Ok result");
    assert_eq!(matrix.len(), 3, "expected 3 rows");
    assert!(matrix.iter().all(|row| row.len() == 3), "expected 3 columns");
}

#[then("the diagonal is zero")]
fn then_diagonal(#[from(result)] result: &ResultCell) {
    let borrowed = result.borrow();
    let matrix = borrowed.as_ref().expect("expected Ok result");
    assert!((0..3).all(|i| matrix[i][i] == 0), "diagonal should be zero");
}

#[then("the matrix is symmetric")]
fn then_symmetric(#[from(result)] result: &ResultCell) {
    let borrowed = result.borrow();
    let matrix = borrowed.as_ref().expect("expected Ok result");
    for i in 0..3 {
        for j in 0..3 {
            assert_eq!(matrix[i][j], matrix[j][i], "expected symmetric costs");
        }
    }
}

#[then("a provider failure is returned")]
fn then_provider_failure(#[from(result)] result: &ResultCell) {
    let borrowed = result.borrow();
    assert!(
        matches!(&*borrowed, Err(err) if err.is_provider_failure()),
        "expected a provider failure, got {borrowed:?}"
    );
}

#[then("an empty input error is returned")]
fn then_empty_error(#[from(result)] result: &ResultCell) {
    let borrowed = result.borrow();
    assert!(
        matches!(&*borrowed, Err(DistanceMatrixError::EmptyInput)),
        "expected EmptyInput error, got {borrowed:?}"
    );
}

// --- Scenario registrations ---

macro_rules! register_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/distance_provider.feature", name = $title)]
        fn $fn_name(provider: RefCell<Option<ProviderChoice>>, result: ResultCell) {
            let _ = (provider, result);
        }
    };
}

register_scenario!(
    building_from_stubbed_service,
    "building a matrix from a stubbed service"
);
register_scenario!(building_offline, "building a matrix offline");
register_scenario!(handling_network_error, "handling a network error");
register_scenario!(handling_service_error, "handling a service error response");
register_scenario!(
    returning_error_for_empty_input,
    "returning an error for empty input"
);
