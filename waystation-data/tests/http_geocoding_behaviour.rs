//! Behavioural tests for [`HttpReverseGeocoder`] against loopback servers.

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use std::time::Duration;
use waystation_core::{Address, GeoPoint, GeocodeError, ReverseGeocoder};
use waystation_data::{HttpReverseGeocoder, HttpReverseGeocoderConfig};

mod support;

use support::{RequestLog, closed_port, serve_once, serve_silently};

const NEW_YORK: &str = r#"{
    "display_name": "City Hall, Manhattan, New York, United States",
    "address": {"city": "New York", "country": "United States"}
}"#;

const TOWN: &str = r#"{
    "display_name": "Broad Street, Hay-on-Wye, United Kingdom",
    "address": {"town": "Hay-on-Wye", "country": "United Kingdom"}
}"#;

#[derive(Default)]
struct GeocodeWorld {
    base_url: RefCell<Option<String>>,
    requests: RefCell<Option<RequestLog>>,
    result: RefCell<Option<Result<Address, GeocodeError>>>,
}

impl GeocodeWorld {
    fn serve(&self, status: &'static str, body: &'static str) {
        let (base_url, log) = serve_once(status, body);
        self.base_url.replace(Some(base_url));
        self.requests.replace(Some(log));
    }

    fn address(&self) -> Address {
        self.result
            .borrow()
            .as_ref()
            .expect("lookup attempted")
            .as_ref()
            .expect("lookup succeeded")
            .clone()
    }

    fn error(&self) -> GeocodeError {
        self.result
            .borrow()
            .as_ref()
            .expect("lookup attempted")
            .as_ref()
            .expect_err("lookup failed")
            .clone()
    }
}

#[fixture]
fn world() -> GeocodeWorld {
    GeocodeWorld::default()
}

#[given("a geocoding service returning an address in New York")]
fn service_new_york(#[from(world)] world: &GeocodeWorld) {
    world.serve("200 OK", NEW_YORK);
}

#[given("a geocoding service returning an address in a town")]
fn service_town(#[from(world)] world: &GeocodeWorld) {
    world.serve("200 OK", TOWN);
}

#[given("a geocoding service failing with status 503")]
fn service_unavailable(#[from(world)] world: &GeocodeWorld) {
    world.serve("503 Service Unavailable", r#"{"error": "overloaded"}"#);
}

#[given("a geocoding service returning malformed JSON")]
fn service_malformed(#[from(world)] world: &GeocodeWorld) {
    world.serve("200 OK", "{ not json");
}

#[given("a geocoding service that is not listening")]
fn service_closed(#[from(world)] world: &GeocodeWorld) {
    world.base_url.replace(Some(closed_port()));
}

#[given("a geocoding service that never answers")]
fn service_silent(#[from(world)] world: &GeocodeWorld) {
    world
        .base_url
        .replace(Some(serve_silently(Duration::from_secs(5))));
}

#[when("I reverse geocode City Hall")]
fn reverse_geocode(#[from(world)] world: &GeocodeWorld) {
    let base_url = world.base_url.borrow().clone().expect("service configured");
    let config = HttpReverseGeocoderConfig::new(base_url)
        .with_timeout(Duration::from_secs(1))
        .with_user_agent("waystation-tests/0.1")
        .without_system_proxy();
    let geocoder = HttpReverseGeocoder::with_config(config).expect("geocoder should build");
    let point = GeoPoint::new(40.7128, -74.006).expect("valid point");
    world.result.replace(Some(geocoder.reverse_geocode(point)));
}

#[then("the address is in New York, United States")]
fn in_new_york(#[from(world)] world: &GeocodeWorld) {
    let address = world.address();
    assert_eq!(
        address.address,
        "City Hall, Manhattan, New York, United States"
    );
    assert_eq!(address.city.as_deref(), Some("New York"));
    assert_eq!(address.country.as_deref(), Some("United States"));
}

#[then("the address is in Hay-on-Wye, United Kingdom")]
fn in_town(#[from(world)] world: &GeocodeWorld) {
    let address = world.address();
    assert_eq!(address.city.as_deref(), Some("Hay-on-Wye"));
    assert_eq!(address.country.as_deref(), Some("United Kingdom"));
}

#[then("the request asked for JSON with address details")]
fn request_parameters(#[from(world)] world: &GeocodeWorld) {
    let requests = world.requests.borrow();
    let log = requests.as_ref().expect("served request");
    let line = log
        .lock()
        .expect("request log lock")
        .clone()
        .expect("request recorded");
    assert_eq!(
        line,
        "GET /reverse?lat=40.7128&lon=-74.006&format=json&addressdetails=1 HTTP/1.1"
    );
}

#[then("an HTTP error with status 503 is returned")]
fn http_error(#[from(world)] world: &GeocodeWorld) {
    let error = world.error();
    assert!(
        matches!(error, GeocodeError::HttpError { status: 503, .. }),
        "expected HttpError 503, got {error:?}"
    );
}

#[then("a parse error is returned")]
fn parse_error(#[from(world)] world: &GeocodeWorld) {
    let error = world.error();
    assert!(
        matches!(error, GeocodeError::ParseError { .. }),
        "expected ParseError, got {error:?}"
    );
}

#[then("a network error is returned")]
fn network_error(#[from(world)] world: &GeocodeWorld) {
    let error = world.error();
    assert!(
        matches!(error, GeocodeError::NetworkError { .. }),
        "expected NetworkError, got {error:?}"
    );
}

#[then("a timeout error is returned")]
fn timeout_error(#[from(world)] world: &GeocodeWorld) {
    let error = world.error();
    assert!(
        matches!(error, GeocodeError::Timeout { timeout_secs: 1, .. }),
        "expected Timeout, got {error:?}"
    );
}

macro_rules! register_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/http_geocoding.feature", name = $title)]
        fn $fn_name(#[from(world)] world: GeocodeWorld) {
            let _ = world;
        }
    };
}

register_scenario!(resolving_city_address, "resolving an address in a city");
register_scenario!(falling_back_to_town, "falling back to the town name");
register_scenario!(handling_error_status, "handling an error status");
register_scenario!(handling_malformed_body, "handling a malformed body");
register_scenario!(handling_unreachable_service, "handling an unreachable service");
register_scenario!(handling_slow_service, "handling a slow service");
