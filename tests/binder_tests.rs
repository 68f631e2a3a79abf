//! Request binding through the full service pipeline.
//!
//! Every test registers a small router, builds an [`AppService`] and feeds it
//! [`ParsedRequest`]s directly, so binding, coercion and validation run exactly
//! as they do behind the HTTP server.

use brrtkit::prelude::*;
use serde_json::{json, Value};

mod common;
use common::requests::{get, post_json, request};

#[derive(serde::Deserialize)]
struct Item {
    name: String,
    tag: String,
}

impl Model for Item {
    fn model_schema() -> ModelSchema {
        ModelSchema::new("Item")
            .field("name", ParamType::String, FieldInfo::required().min_length(1))
            .field("tag", ParamType::String, FieldInfo::optional("none"))
    }
}

struct Color;

impl ParamEnum for Color {
    fn enum_type() -> EnumType {
        EnumType::new("Color")
            .member("red", "red")
            .member("green", "green")
    }
}

/// Handler echoing the bound arguments.
fn echo(req: HandlerRequest) -> anyhow::Result<HandlerResponse> {
    Ok(HandlerResponse::json(200, &req.args.to_json()))
}

fn service_with(route: Route) -> AppService {
    let mut router = ApiRouter::new("test");
    router.add(route, echo).unwrap();
    let mut app = App::new();
    app.register_router(&router).unwrap();
    app.into_service().unwrap()
}

fn body_json(res: &HandlerResponse) -> Value {
    serde_json::from_slice(&res.body).unwrap()
}

#[test]
fn test_single_model_body_binds_whole_body() {
    let svc = service_with(
        Route::post("/items", "create_item").arg(Arg::model::<Item>("item").param(Param::body())),
    );
    let res = svc.handle(post_json("/items", &json!({"name": "lamp"})));
    assert_eq!(res.status, 200);
    assert_eq!(body_json(&res), json!({"item": {"name": "lamp", "tag": "none"}}));
}

#[test]
fn test_model_body_deserializes_in_handler() {
    let mut router = ApiRouter::new("test");
    router
        .add(
            Route::post("/items", "create_item").arg(Arg::model::<Item>("item").param(Param::body())),
            |req| {
                let item: Item = req.args.get("item")?;
                Ok(HandlerResponse::text(201, format!("{}:{}", item.name, item.tag)))
            },
        )
        .unwrap();
    let mut app = App::new();
    app.register_router(&router).unwrap();
    let svc = app.into_service().unwrap();

    let res = svc.handle(post_json("/items", &json!({"name": "desk", "tag": "office"})));
    assert_eq!(res.status, 201);
    assert_eq!(res.body, b"desk:office");
}

#[test]
fn test_two_body_params_read_their_own_keys() {
    let svc = service_with(
        Route::post("/points", "add_point")
            .arg(Arg::integer("x").param(Param::body()))
            .arg(Arg::integer("y").param(Param::body())),
    );
    let res = svc.handle(post_json("/points", &json!({"x": 1, "y": 2, "z": 3})));
    assert_eq!(res.status, 200);
    assert_eq!(body_json(&res), json!({"x": 1, "y": 2}));
}

#[test]
fn test_missing_required_query_is_422() {
    let svc = service_with(Route::get("/search", "search").arg(Arg::string("q")));
    let res = svc.handle(get("/search"));
    assert_eq!(res.status, 422);
    assert_eq!(
        body_json(&res),
        json!([{"loc": ["query", "q"], "msg": "field required", "type": "value_error.missing"}])
    );
}

#[test]
fn test_enum_query_delivers_primitive_value() {
    let svc = service_with(
        Route::get("/paint", "paint").arg(Arg::new("color", ParamType::enumeration::<Color>())),
    );
    let res = svc.handle(get("/paint?color=red"));
    assert_eq!(res.status, 200);
    assert_eq!(body_json(&res), json!({"color": "red"}));

    let res = svc.handle(get("/paint?color=blue"));
    assert_eq!(res.status, 422);
    assert_eq!(body_json(&res)[0]["loc"], json!(["query", "color"]));
    assert_eq!(body_json(&res)[0]["type"], "type_error.enum");
}

#[test]
fn test_placeholder_argument_is_required_path_param() {
    let svc = service_with(
        Route::get("/items/{item_id}", "get_item").arg(Arg::integer("item_id").default_value(5)),
    );
    let res = svc.handle(get("/items/7"));
    assert_eq!(body_json(&res), json!({"item_id": 7}));

    let res = svc.handle(get("/items/seven"));
    assert_eq!(res.status, 422);
    let errors = body_json(&res);
    assert_eq!(errors[0]["loc"], json!(["path", "item_id"]));
    assert_eq!(errors[0]["type"], "type_error");
}

#[test]
fn test_path_overrides_query_and_header() {
    let svc = service_with(Route::get("/items/{item_id}", "get_item").arg(Arg::string("item_id")));
    let res = svc.handle(request(
        "GET",
        "/items/from-path?item_id=from-query",
        &[("item_id", "from-header")],
        &[],
    ));
    assert_eq!(body_json(&res), json!({"item_id": "from-path"}));
}

#[test]
fn test_header_overrides_query() {
    let svc = service_with(
        Route::get("/whoami", "whoami").arg(Arg::string("x_user").param(Param::header())),
    );
    let res = svc.handle(request("GET", "/whoami?x_user=query", &[("X-User", "header")], &[]));
    assert_eq!(body_json(&res), json!({"x_user": "header"}));
}

#[test]
fn test_alias_and_defaults() {
    let svc = service_with(
        Route::get("/list", "list")
            .arg(Arg::integer("page_size").param(Param::query().alias("pageSize").with_default(10)))
            .arg(Arg::boolean("verbose").default_value(false))
            .arg(Arg::new("tags", ParamType::array(ParamType::String)).default_value(json!([]))),
    );
    let res = svc.handle(get("/list"));
    assert_eq!(
        body_json(&res),
        json!({"page_size": 10, "verbose": false, "tags": []})
    );

    let res = svc.handle(get("/list?pageSize=3&verbose=true&tags=a,b"));
    assert_eq!(
        body_json(&res),
        json!({"page_size": 3, "verbose": true, "tags": ["a", "b"]})
    );
}

#[test]
fn test_numeric_bounds() {
    let svc = service_with(
        Route::get("/list", "list")
            .arg(Arg::integer("limit").param(Param::query().ge(1.0).le(50.0).with_default(10))),
    );
    assert_eq!(svc.handle(get("/list?limit=50")).status, 200);
    let res = svc.handle(get("/list?limit=51"));
    assert_eq!(res.status, 422);
    assert_eq!(body_json(&res)[0]["type"], "value_error.number");
}

#[test]
fn test_nested_model_error_location() {
    let svc = service_with(
        Route::post("/items", "create_item").arg(Arg::model::<Item>("item").param(Param::body())),
    );
    let res = svc.handle(post_json("/items", &json!({"name": ""})));
    assert_eq!(res.status, 422);
    assert_eq!(body_json(&res)[0]["loc"], json!(["body", "item", "name"]));

    let res = svc.handle(post_json("/items", &json!({"tag": "x"})));
    assert_eq!(body_json(&res)[0]["loc"], json!(["body", "item", "name"]));
    assert_eq!(body_json(&res)[0]["type"], "value_error.missing");
}

#[test]
fn test_invalid_json_body() {
    let svc = service_with(
        Route::post("/items", "create_item").arg(Arg::model::<Item>("item").param(Param::body())),
    );
    let res = svc.handle(request(
        "POST",
        "/items",
        &[("Content-Type", "application/json")],
        b"{not json",
    ));
    assert_eq!(res.status, 422);
    let errors = body_json(&res);
    assert!(errors
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e["type"] == "value_error.jsondecode"));
}

#[test]
fn test_urlencoded_form() {
    let svc = service_with(
        Route::post("/login", "login")
            .arg(Arg::string("username").param(Param::form_urlencoded()))
            .arg(Arg::string("password").param(Param::form_urlencoded().min_length(4))),
    );
    let res = svc.handle(request(
        "POST",
        "/login",
        &[("Content-Type", "application/x-www-form-urlencoded")],
        b"username=ann&password=s3cret",
    ));
    assert_eq!(res.status, 200);
    assert_eq!(body_json(&res), json!({"username": "ann", "password": "s3cret"}));
}

#[test]
fn test_multipart_file_upload() {
    let mut router = ApiRouter::new("files");
    router
        .add(
            Route::post("/upload", "upload")
                .arg(Arg::string("title").param(Param::form()))
                .arg(Arg::string("document").param(Param::file())),
            |req| {
                let title: String = req.args.get("title")?;
                let file = req
                    .args
                    .file("document")
                    .ok_or_else(|| anyhow::anyhow!("no file"))?;
                Ok(HandlerResponse::json(
                    200,
                    &json!({
                        "title": title,
                        "filename": file.filename,
                        "bytes": String::from_utf8_lossy(&file.data),
                        "described": req.args.value("document"),
                    }),
                ))
            },
        )
        .unwrap();
    let mut app = App::new();
    app.register_router(&router).unwrap();
    let svc = app.into_service().unwrap();

    let body = "--b0undary\r\n\
        Content-Disposition: form-data; name=\"title\"\r\n\r\n\
        report\r\n\
        --b0undary\r\n\
        Content-Disposition: form-data; name=\"document\"; filename=\"r.txt\"\r\n\
        Content-Type: text/plain\r\n\r\n\
        hello\r\n\
        --b0undary--\r\n";
    let res = svc.handle(request(
        "POST",
        "/upload",
        &[("Content-Type", "multipart/form-data; boundary=b0undary")],
        body.as_bytes(),
    ));
    assert_eq!(res.status, 200);
    let out = body_json(&res);
    assert_eq!(out["title"], "report");
    assert_eq!(out["filename"], "r.txt");
    assert_eq!(out["bytes"], "hello");
    assert_eq!(out["described"]["size"], 5);

    let res = svc.handle(request(
        "POST",
        "/upload",
        &[("Content-Type", "multipart/form-data; boundary=b0undary")],
        b"--b0undary--\r\n",
    ));
    assert_eq!(res.status, 422);
}

#[test]
fn test_multipart_file_containing_boundary_text() {
    let svc = service_with(
        Route::post("/upload", "upload").arg(Arg::string("document").param(Param::file())),
    );
    let body = "--b0undary\r\n\
        Content-Disposition: form-data; name=\"document\"; filename=\"notes.txt\"\r\n\r\n\
        before--b0undaryafter\r\n\
        --b0undary--\r\n";
    let res = svc.handle(request(
        "POST",
        "/upload",
        &[("Content-Type", "multipart/form-data; boundary=b0undary")],
        body.as_bytes(),
    ));
    assert_eq!(res.status, 200);
    let out = body_json(&res);
    assert_eq!(out["document"]["filename"], "notes.txt");
    assert_eq!(out["document"]["size"], "before--b0undaryafter".len());
}

#[test]
fn test_multipart_without_boundary_is_422() {
    let svc = service_with(
        Route::post("/upload", "upload").arg(Arg::string("document").param(Param::file())),
    );
    let res = svc.handle(request(
        "POST",
        "/upload",
        &[("Content-Type", "multipart/form-data")],
        b"--b0undary--\r\n",
    ));
    assert_eq!(res.status, 422);
    let errors = body_json(&res);
    assert_eq!(errors[0]["loc"], json!(["body"]));
    assert_eq!(errors[0]["type"], "value_error.form");
}

#[test]
fn test_dependency_arguments_are_flattened() {
    let svc = service_with(
        Route::get("/pets", "list_pets").arg(Arg::new("paging", ParamType::Object).depends(
            Depends::on(vec![
                Arg::integer("limit").default_value(20),
                Arg::integer("offset").default_value(0),
            ]),
        )),
    );
    let res = svc.handle(get("/pets?offset=40"));
    assert_eq!(body_json(&res), json!({"limit": 20, "offset": 40}));
}
