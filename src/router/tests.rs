use super::{RouteLookup, Router};
use crate::handler::HandlerResponse;
use crate::params::Arg;
use crate::routing::{ApiRouter, EndpointRegistry};
use http::Method;

fn table(routes: &[(Method, &str)]) -> Router {
    let mut api = ApiRouter::new("t");
    for (i, (method, rule)) in routes.iter().enumerate() {
        let route = crate::routing::Route::new(method.clone(), *rule, format!("op{i}"));
        api.add(route, |_| Ok(HandlerResponse::no_content())).unwrap();
    }
    let mut registry = EndpointRegistry::new();
    registry.register_router(&api).unwrap();
    Router::new(&registry).unwrap()
}

#[test]
fn test_root_path() {
    let (re, params) = Router::path_to_regex("/").unwrap();
    assert!(re.is_match("/"));
    assert!(params.is_empty());
}

#[test]
fn test_parameterized_path() {
    let (re, params) = Router::path_to_regex("/items/{id}").unwrap();
    assert!(re.is_match("/items/123"));
    assert!(!re.is_match("/items/123/extra"));
    assert_eq!(params, vec!["id"]);
}

#[test]
fn test_literals_are_escaped() {
    let (re, _) = Router::path_to_regex("/v1.0/items").unwrap();
    assert!(re.is_match("/v1.0/items"));
    assert!(!re.is_match("/v1x0/items"));
}

#[test]
fn test_embedded_placeholder() {
    let (re, params) = Router::path_to_regex("/files/{name}.{ext}").unwrap();
    let caps = re.captures("/files/report.pdf").unwrap();
    assert_eq!(&caps[1], "report");
    assert_eq!(&caps[2], "pdf");
    assert_eq!(params, vec!["name", "ext"]);
}

#[test]
fn test_match_and_params() {
    let mut api = ApiRouter::new("pets");
    api.get("/pets/{pet_id}", "get_pet", vec![Arg::integer("pet_id")], |_| {
        Ok(HandlerResponse::no_content())
    })
    .unwrap();
    let mut registry = EndpointRegistry::new();
    registry.register_router(&api).unwrap();
    let router = Router::new(&registry).unwrap();

    match router.route(&Method::GET, "/pets/42") {
        RouteLookup::Matched(m) => {
            assert_eq!(m.endpoint.spec.operation, "get_pet");
            assert_eq!(m.get_path_param("pet_id"), Some("42"));
        }
        other => panic!("expected a match, got {other:?}"),
    }
}

#[test]
fn test_method_not_allowed() {
    let router = table(&[(Method::GET, "/pets"), (Method::POST, "/pets")]);
    match router.route(&Method::DELETE, "/pets") {
        RouteLookup::MethodNotAllowed(allowed) => {
            assert_eq!(allowed, vec![Method::GET, Method::POST]);
        }
        other => panic!("expected 405, got {other:?}"),
    }
    assert!(matches!(router.route(&Method::GET, "/cats"), RouteLookup::NotFound));
}

#[test]
fn test_registration_order_wins() {
    let router = table(&[(Method::GET, "/pets/mine"), (Method::GET, "/pets/{pet_id}")]);
    match router.route(&Method::GET, "/pets/mine") {
        RouteLookup::Matched(m) => assert_eq!(m.endpoint.spec.operation, "op0"),
        other => panic!("expected a match, got {other:?}"),
    }
    assert_eq!(router.path_patterns(), vec!["/pets/mine", "/pets/{pet_id}"]);
}

#[test]
fn test_two_placeholders_in_one_segment() {
    let router = table(&[(Method::GET, "/files/{name}.{ext}")]);
    match router.route(&Method::GET, "/files/report.tar.gz") {
        RouteLookup::Matched(m) => {
            assert_eq!(m.get_path_param("name"), Some("report"));
            assert_eq!(m.get_path_param("ext"), Some("tar.gz"));
        }
        other => panic!("expected a match, got {other:?}"),
    }
    assert!(matches!(router.route(&Method::GET, "/files/report"), RouteLookup::NotFound));
}

#[test]
fn test_path_params_are_percent_decoded() {
    let router = table(&[(Method::GET, "/files/{name}")]);
    match router.route(&Method::GET, "/files/hello%20world") {
        RouteLookup::Matched(m) => assert_eq!(m.get_path_param("name"), Some("hello world")),
        other => panic!("expected a match, got {other:?}"),
    }
    match router.route(&Method::GET, "/files/a%2Fb") {
        RouteLookup::Matched(m) => assert_eq!(m.get_path_param("name"), Some("a/b")),
        other => panic!("expected a match, got {other:?}"),
    }
}

#[test]
fn test_invalid_utf8_path_param() {
    let router = table(&[(Method::GET, "/files/{name}")]);
    match router.route(&Method::GET, "/files/%FF%FE") {
        RouteLookup::MalformedPath(name) => assert_eq!(name, "name"),
        other => panic!("expected a malformed path, got {other:?}"),
    }
}
