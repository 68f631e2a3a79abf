//! OpenAPI document generation over realistic routers.

use brrtkit::prelude::*;
use brrtkit::routing::EndpointRegistry;
use brrtkit::security::SecurityRegistry;
use serde::Serialize;
use serde_json::{json, Map, Value};

#[derive(Serialize)]
struct Owner {
    name: String,
}

impl Model for Owner {
    fn model_schema() -> ModelSchema {
        ModelSchema::new("Owner").field("name", ParamType::String, FieldInfo::required())
    }
}

#[derive(Serialize)]
struct Pet {
    name: String,
    owner: Owner,
}

impl Model for Pet {
    fn model_schema() -> ModelSchema {
        ModelSchema::new("Pet")
            .description("A pet in the store")
            .field("name", ParamType::String, FieldInfo::required().max_length(32))
            .field("owner", ParamType::model::<Owner>(), FieldInfo::required())
    }
}

struct Size;

impl ParamEnum for Size {
    fn enum_type() -> EnumType {
        EnumType::new("Size").member("small", "s").member("large", "l")
    }
}

fn ok(_: HandlerRequest) -> anyhow::Result<HandlerResponse> {
    Ok(HandlerResponse::no_content())
}

fn pet_routers(security: &SecurityRegistry) -> ApiRouter {
    let mut pets = ApiRouter::new("pets").prefix("/pets");
    pets.add(
        Route::get("/", "list_pets")
            .arg(Arg::integer("limit").param(Param::query().with_default(10).ge(1.0)))
            .arg(Arg::new("size", ParamType::enumeration::<Size>()).default_value("s")),
        ok,
    )
    .unwrap();
    pets.add(
        Route::post("/", "create_pet")
            .summary("Create a pet")
            .response(
                201,
                model_example::<Pet>(&Pet {
                    name: "Rex".to_string(),
                    owner: Owner {
                        name: "Ann".to_string(),
                    },
                })
                .unwrap(),
            )
            .arg(Arg::model::<Pet>("pet").param(Param::body())),
        ok,
    )
    .unwrap();
    pets.add(
        Route::delete("/<int:pet_id>", "delete_pet")
            .security(HttpBasicSecurity::with_registry("admin", security))
            .arg(Arg::integer("pet_id")),
        ok,
    )
    .unwrap();

    let mut internal = ApiRouter::new("internal").prefix("/internal").auto_swagger(false);
    internal.get("/health", "health", Vec::new(), ok).unwrap();

    let mut api = ApiRouter::new("api").prefix("/api").tags(["v1"]);
    api.include_router(pets);
    api.include_router(internal);
    api.add(
        Route::get("/custom", "custom").custom_swagger(json!({"summary": "hand written", "responses": {}})),
        ok,
    )
    .unwrap();
    api
}

fn generate() -> (SwaggerGenerator, EndpointRegistry) {
    let security = SecurityRegistry::new();
    let mut registry = EndpointRegistry::new();
    registry.register_router(&pet_routers(&security)).unwrap();
    let generator = SwaggerGenerator::new("Pet Store")
        .version("2.1.0")
        .servers(["https://pets.example.com"])
        .security_registry(security);
    (generator, registry)
}

#[test]
fn test_generation_is_idempotent() {
    let (generator, registry) = generate();
    let first = generator.generate(&registry);
    let second = generator.generate(&registry);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_document_header() {
    let (generator, registry) = generate();
    let doc = generator.generate(&registry);
    assert_eq!(doc["openapi"], "3.1.0");
    assert_eq!(doc["info"]["title"], "Pet Store");
    assert_eq!(doc["info"]["version"], "2.1.0");
    assert_eq!(doc["servers"], json!([{"url": "https://pets.example.com"}]));
}

#[test]
fn test_nested_prefixes_and_hidden_routers() {
    let (generator, registry) = generate();
    let doc = generator.generate(&registry);
    let paths = doc["paths"].as_object().unwrap();
    assert!(paths.contains_key("/api/pets/"));
    assert!(paths.contains_key("/api/pets/{pet_id}"));
    assert!(!paths.contains_key("/api/internal/health"));
    assert_eq!(doc["paths"]["/api/custom"]["get"]["summary"], "hand written");
    assert_eq!(registry.len(), 5);
}

#[test]
fn test_query_parameters() {
    let (generator, registry) = generate();
    let doc = generator.generate(&registry);
    let op = &doc["paths"]["/api/pets/"]["get"];
    assert_eq!(op["tags"], json!(["pets"]));
    assert_eq!(op["summary"], "list_pets");
    let params = op["parameters"].as_array().unwrap();
    assert_eq!(params[0]["name"], "limit");
    assert_eq!(params[0]["in"], "query");
    assert_eq!(params[0]["required"], false);
    assert_eq!(params[0]["default"], 10);
    assert_eq!(params[0]["schema"]["minimum"], 1);
    assert_eq!(params[1]["name"], "size");
    assert_eq!(
        params[1]["schema"]["allOf"][0]["$ref"],
        "#/components/schemas/Size"
    );
    assert_eq!(
        doc["components"]["schemas"]["Size"],
        json!({"title": "Size", "enum": ["s", "l"], "type": "string"})
    );
    assert!(op.get("requestBody").is_none());
}

#[test]
fn test_model_body_and_nested_components() {
    let (generator, registry) = generate();
    let doc = generator.generate(&registry);
    let op = &doc["paths"]["/api/pets/"]["post"];
    assert_eq!(op["summary"], "Create a pet");
    assert_eq!(
        op["requestBody"]["content"]["application/json"]["schema"]["$ref"],
        "#/components/schemas/Pet"
    );
    let pet = &doc["components"]["schemas"]["Pet"];
    assert_eq!(pet["description"], "A pet in the store");
    assert_eq!(pet["required"], json!(["name", "owner"]));
    assert_eq!(
        pet["properties"]["owner"]["allOf"][0]["$ref"],
        "#/components/schemas/Owner"
    );
    assert!(doc["components"]["schemas"]["Owner"].is_object());

    let created = &op["responses"]["201"]["content"]["application/json"];
    assert_eq!(created["example"]["owner"]["name"], "Ann");
    assert!(op["responses"].get("422").is_none());
}

#[test]
fn test_default_responses_and_security() {
    let (generator, registry) = generate();
    let doc = generator.generate(&registry);
    let op = &doc["paths"]["/api/pets/{pet_id}"]["delete"];
    assert_eq!(op["responses"]["200"]["description"], "Successful Response");
    assert!(op["responses"]["422"].is_object());
    assert_eq!(op["security"], json!([{"admin": []}]));
    assert_eq!(op["parameters"][0]["in"], "path");
    assert_eq!(op["parameters"][0]["required"], true);
    assert_eq!(
        doc["components"]["securitySchemes"]["admin"],
        json!({"type": "http", "scheme": "basic"})
    );
    assert_eq!(doc["security"], json!([]));
}

#[test]
fn test_additional_paths_and_schemas() {
    let (generator, registry) = generate();
    let mut extra_paths = Map::new();
    extra_paths.insert(
        "/api/pets/".to_string(),
        json!({"options": {"summary": "CORS preflight", "responses": {}}}),
    );
    let mut extra_schemas = Map::new();
    extra_schemas.insert("Error".to_string(), json!({"type": "object"}));
    let doc = generator
        .additional_paths(extra_paths)
        .additional_component_schemas(extra_schemas)
        .generate(&registry);
    assert!(doc["paths"]["/api/pets/"]["get"].is_object());
    assert_eq!(doc["paths"]["/api/pets/"]["options"]["summary"], "CORS preflight");
    assert!(doc["components"]["schemas"]["Error"].is_object());
    assert!(doc["components"]["schemas"]["Pet"].is_object());
}

#[test]
fn test_document_served_by_app() {
    let security = SecurityRegistry::new();
    let mut app = App::new();
    app.register_router(&pet_routers(&security)).unwrap();
    let svc = app
        .with_docs(
            SwaggerGenerator::new("Served")
                .json_url("/spec.json")
                .security_registry(security),
            None,
        )
        .unwrap()
        .into_service()
        .unwrap();

    let res = svc.handle(brrtkit::server::ParsedRequest {
        method: "GET".to_string(),
        path: "/spec.json".to_string(),
        ..Default::default()
    });
    assert_eq!(res.status, 200);
    assert_eq!(res.get_header("Content-Type"), Some("application/json"));
    let doc: Value = serde_json::from_slice(&res.body).unwrap();
    assert_eq!(Some(doc), svc.openapi());
}
