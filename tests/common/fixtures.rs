use scenario::{CollectionSchema, DocumentStore, FieldSchema, OpenStore, Scenario, ScenarioEngine, SqliteStore};
use serde_json::Value;
use std::sync::Arc;

fn project_schema() -> FieldSchema {
    FieldSchema::object([
        ("name", FieldSchema::string()),
        ("description", FieldSchema::string()),
    ])
}

/// Define users, widgets, groups and projects on `store`.
pub async fn define_fixtures(store: &dyn DocumentStore) {
    store
        .define_collection(
            "widgets",
            CollectionSchema::new()
                .with_field("name", FieldSchema::string())
                .with_field("content", FieldSchema::string())
                .with_field("status", FieldSchema::string())
                .with_field("testSet", FieldSchema::string()),
        )
        .await
        .unwrap();

    store
        .define_collection(
            "users",
            CollectionSchema::new()
                .with_field("name", FieldSchema::string())
                .with_field("role", FieldSchema::string())
                .with_field("favourite", FieldSchema::reference("widgets"))
                .with_field("items", FieldSchema::array(FieldSchema::reference("widgets")))
                .with_field(
                    "mostPurchased",
                    FieldSchema::array(FieldSchema::object([
                        ("number", FieldSchema::number()),
                        ("item", FieldSchema::reference("widgets")),
                    ])),
                )
                .with_field("testSet", FieldSchema::string())
                .with_field("projects", FieldSchema::array(project_schema())),
        )
        .await
        .unwrap();

    store
        .define_collection(
            "groups",
            CollectionSchema::new()
                .with_field("name", FieldSchema::string())
                .with_field(
                    "preferences",
                    FieldSchema::object([(
                        "defaults",
                        FieldSchema::object([("items", FieldSchema::array(FieldSchema::reference("widgets")))]),
                    )]),
                )
                .with_field("testSet", FieldSchema::string())
                .with_field(
                    "projectAwards",
                    FieldSchema::array(FieldSchema::object([
                        ("name", FieldSchema::string()),
                        ("ribbonColor", FieldSchema::string()),
                        ("project", FieldSchema::reference("projects")),
                    ])),
                ),
        )
        .await
        .unwrap();

    store
        .define_collection(
            "projects",
            CollectionSchema::new()
                .with_field("name", FieldSchema::string())
                .with_field("description", FieldSchema::string()),
        )
        .await
        .unwrap();
}

/// In-memory SQLite store with the fixture collections defined.
pub async fn fixture_store() -> Arc<SqliteStore> {
    let store = SqliteStore::open_in_memory().unwrap();
    define_fixtures(&store).await;
    Arc::new(store)
}

pub async fn fixture_engine() -> ScenarioEngine {
    ScenarioEngine::new(fixture_store().await)
}

pub fn scenario_from(value: Value) -> Scenario {
    Scenario::from_value(value).unwrap()
}
