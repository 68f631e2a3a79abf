use anyhow::{anyhow, Context};
use brrtkit::config::AppConfig;
use brrtkit::logging::{init_logging_with_config, LogConfig, LogFormat};
use brrtkit::prelude::*;
use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

#[derive(Parser)]
#[command(name = "brrtkit-demo")]
#[command(about = "Pet store demo for brrtkit", long_about = None)]
struct Cli {
    /// Address to listen on; overrides the config file and BRRTKIT_ADDR
    #[arg(long)]
    addr: Option<String>,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// json or pretty; overrides BRRTKIT_LOG_FORMAT
    #[arg(long)]
    log_format: Option<String>,

    /// Debug-level pretty logs with source locations, ignoring BRRTKIT_LOG_*
    #[arg(long)]
    dev: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Kind {
    Dog,
    Cat,
    Bird,
}

impl ParamEnum for Kind {
    fn enum_type() -> EnumType {
        EnumType::new("Kind")
            .member("dog", "dog")
            .member("cat", "cat")
            .member("bird", "bird")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NewPet {
    name: String,
    kind: Kind,
    tag: Option<String>,
}

impl Model for NewPet {
    fn model_schema() -> ModelSchema {
        ModelSchema::new("NewPet")
            .description("A pet to add to the store")
            .field(
                "name",
                ParamType::String,
                FieldInfo::required().min_length(1).max_length(64).example("Rex"),
            )
            .field("kind", ParamType::enumeration::<Kind>(), FieldInfo::required())
            .field("tag", ParamType::String, FieldInfo::optional(Value::Null))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Pet {
    id: u64,
    name: String,
    kind: Kind,
    tag: Option<String>,
}

impl Model for Pet {
    fn model_schema() -> ModelSchema {
        ModelSchema::new("Pet")
            .field("id", ParamType::Integer, FieldInfo::required())
            .field("name", ParamType::String, FieldInfo::required())
            .field("kind", ParamType::enumeration::<Kind>(), FieldInfo::required())
            .field("tag", ParamType::String, FieldInfo::optional(Value::Null))
    }
}

/// `limit`/`offset` query arguments shared by list endpoints.
struct Pagination;

impl Dependency for Pagination {
    fn signature() -> Signature {
        vec![
            Arg::integer("limit").param(Param::query().with_default(20).ge(1.0).le(100.0)),
            Arg::integer("offset").param(Param::query().with_default(0).ge(0.0)),
        ]
    }
}

#[derive(Debug, Default)]
struct Store {
    next_id: u64,
    pets: BTreeMap<u64, Pet>,
}

type SharedStore = Arc<Mutex<Store>>;

fn lock(store: &SharedStore) -> std::sync::MutexGuard<'_, Store> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

fn pets_router(store: &SharedStore) -> anyhow::Result<ApiRouter> {
    let mut router = ApiRouter::new("pets").prefix("/api");

    let list_store = Arc::clone(store);
    router.add(
        Route::get("/pets", "list_pets")
            .summary("List pets")
            .arg(Arg::new("pagination", ParamType::Object).depends(Depends::of::<Pagination>()))
            .arg(
                Arg::new("kind", ParamType::enumeration::<Kind>())
                    .param(
                        Param::query()
                            .with_default(Value::Null)
                            .description("Only pets of this kind"),
                    ),
            ),
        move |req| {
            let limit: usize = req.args.get("limit")?;
            let offset: usize = req.args.get("offset")?;
            let kind: Option<Kind> = req.args.get("kind")?;
            let store = lock(&list_store);
            let pets: Vec<&Pet> = store
                .pets
                .values()
                .filter(|p| kind.map_or(true, |k| p.kind == k))
                .skip(offset)
                .take(limit)
                .collect();
            Ok(HandlerResponse::json_from(200, &pets)?)
        },
    )?;

    let get_store = Arc::clone(store);
    router.add(
        Route::get("/pets/{pet_id}", "get_pet")
            .summary("Fetch one pet")
            .response(
                200,
                model_example::<Pet>(&Pet {
                    id: 1,
                    name: "Rex".to_string(),
                    kind: Kind::Dog,
                    tag: None,
                })?,
            )
            .response(404, json!({"description": "Pet not found"}))
            .arg(Arg::integer("pet_id").param(Param::path().ge(1.0))),
        move |req| {
            let id: u64 = req.args.get("pet_id")?;
            match lock(&get_store).pets.get(&id) {
                Some(pet) => Ok(HandlerResponse::json_from(200, pet)?),
                None => Ok(HandlerResponse::error(404, format!("pet {id} not found"))),
            }
        },
    )?;

    let create_store = Arc::clone(store);
    router.add(
        Route::post("/pets", "create_pet")
            .summary("Add a pet")
            .response_description("The stored pet")
            .arg(Arg::model::<NewPet>("pet").param(Param::body())),
        move |req| {
            let new: NewPet = req.args.get("pet")?;
            let mut store = lock(&create_store);
            store.next_id += 1;
            let pet = Pet {
                id: store.next_id,
                name: new.name,
                kind: new.kind,
                tag: new.tag,
            };
            store.pets.insert(pet.id, pet.clone());
            info!(pet_id = pet.id, "Pet created");
            Ok(HandlerResponse::json_from(201, &pet)?)
        },
    )?;

    let admin_user =
        std::env::var("BRRTKIT_DEMO_ADMIN_USER").unwrap_or_else(|_| "admin".to_string());
    let admin_password =
        std::env::var("BRRTKIT_DEMO_ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_string());
    let basic = HttpBasicSecurity::new("admin_basic").verify_with(move |creds| {
        if creds.username == admin_user && creds.password == admin_password {
            Ok(Some(json!({"sub": creds.username})))
        } else {
            Err(SecurityError::InvalidCredentials("Incorrect username or password".to_string()))
        }
    });
    let delete_store = Arc::clone(store);
    router.add(
        Route::delete("/pets/{pet_id}", "delete_pet")
            .summary("Remove a pet")
            .security(basic)
            .arg(Arg::integer("pet_id")),
        move |req| {
            let id: u64 = req.args.get("pet_id")?;
            match lock(&delete_store).pets.remove(&id) {
                Some(_) => Ok(HandlerResponse::no_content()),
                None => Ok(HandlerResponse::error(404, format!("pet {id} not found"))),
            }
        },
    )?;

    Ok(router)
}

fn account_router() -> anyhow::Result<ApiRouter> {
    let secret =
        std::env::var("BRRTKIT_DEMO_JWT_SECRET").unwrap_or_else(|_| "change-me".to_string());
    let mut router = ApiRouter::new("account").prefix("/api").tags(["account"]);
    router.add(
        Route::get("/me", "whoami")
            .summary("Claims of the bearer token")
            .security(HttpBearerSecurity::new("jwt").with_secret(secret))
            .arg(Arg::string("x_client").param(Param::header().with_default("unknown"))),
        |req| {
            let client: String = req.args.get("x_client")?;
            Ok(HandlerResponse::json(
                200,
                &json!({"claims": req.claims, "client": client}),
            ))
        },
    )?;
    Ok(router)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut log_config = if cli.dev {
        LogConfig::default_dev()
    } else {
        LogConfig::from_env()
    };
    if let Some(format) = &cli.log_format {
        log_config.format = LogFormat::parse(format);
    }
    init_logging_with_config(&log_config)?;

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    }
    .apply_env();
    if let Some(addr) = cli.addr {
        config.addr = addr;
    }

    let store = SharedStore::default();
    let mut app = App::new();
    app.register_router(&pets_router(&store)?)?;
    app.register_router(&account_router()?)?;
    let service = app
        .with_docs(config.swagger_generator(), Some(config.swagger_ui()))?
        .into_service()?;

    let handle = HttpServer(service)
        .start(config.addr.as_str())
        .with_context(|| format!("Failed to bind {}", config.addr))?;
    handle.wait_ready()?;
    info!(
        addr = %handle.addr(),
        docs = %config.docs_url,
        openapi = %config.json_url,
        "Pet store demo listening"
    );
    handle.join().map_err(|_| anyhow!("server coroutine panicked"))
}
