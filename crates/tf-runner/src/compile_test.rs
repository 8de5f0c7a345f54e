use super::*;
use serde_json::json;
use tf_core::{ForeignSource, Materialize, Project, WriteMode};

fn table(name: &str, source: Source) -> Arc<Model> {
    Model::materialized(
        name,
        source,
        vec![Stage::new(json!({"$match": {"model": name}}))],
        Materialize::collection(WriteMode::Replace),
    )
}

fn compile_in(project: &Project, name: &str) -> CompiledModel {
    let model = project.get_model(name).expect("model registered");
    compile_model(model, project.models()).expect("compiles")
}

#[test]
fn test_collection_source_reads_directly() {
    let model = table("facts", Source::collection_in("landing", "raw"));
    let project = Project::new("p", vec![model]).unwrap();

    let compiled = compile_in(&project, "facts");
    assert_eq!(compiled.read_database.as_deref(), Some("landing"));
    assert_eq!(compiled.read_collection, "raw");
    assert_eq!(compiled.stages, vec![json!({"$match": {"model": "facts"}})]);
}

#[test]
fn test_materialized_upstream_reads_its_output_collection() {
    let upstream = table("stg_orders", Source::collection("raw_orders"));
    let downstream = table("fct_orders", Source::model(&upstream));
    let project = Project::new("p", vec![downstream]).unwrap();

    let compiled = compile_in(&project, "fct_orders");
    assert_eq!(compiled.read_collection, "stg_orders");
    assert!(compiled.read_database.is_none());
    // Nothing spliced: the upstream has its own backing collection.
    assert_eq!(compiled.stages.len(), 1);
}

#[test]
fn test_ephemeral_upstream_is_spliced_in_front() {
    let eph = Model::new(
        "cleaned",
        Source::collection("raw"),
        vec![Stage::new(json!({"$match": {"ok": true}}))],
    );
    let downstream = table("facts", Source::model(&eph));
    let project = Project::new("p", vec![downstream]).unwrap();

    let compiled = compile_in(&project, "facts");
    assert_eq!(compiled.read_collection, "raw");
    assert_eq!(
        compiled.stages,
        vec![
            json!({"$match": {"ok": true}}),
            json!({"$match": {"model": "facts"}}),
        ]
    );
}

#[test]
fn test_ephemeral_chain_splices_recursively() {
    let inner = Model::new(
        "inner",
        Source::collection("raw"),
        vec![Stage::new(json!({"$match": {"step": 1}}))],
    );
    let outer = Model::new(
        "outer",
        Source::model(&inner),
        vec![Stage::new(json!({"$match": {"step": 2}}))],
    );
    let sink = table("sink", Source::model(&outer));
    let project = Project::new("p", vec![sink]).unwrap();

    let compiled = compile_in(&project, "sink");
    assert_eq!(compiled.read_collection, "raw");
    assert_eq!(
        compiled.stages,
        vec![
            json!({"$match": {"step": 1}}),
            json!({"$match": {"step": 2}}),
            json!({"$match": {"model": "sink"}}),
        ]
    );
}

#[test]
fn test_foreign_materialized_reference_renders_collection_name() {
    let users = table("users", Source::collection("raw_users"));
    let enriched = Model::materialized(
        "enriched",
        Source::collection("orders"),
        vec![Stage::with_foreign(
            json!({"$lookup": {"as": "user", "localField": "uid", "foreignField": "_id"}}),
            ForeignSource::new(Source::model(&users), "$lookup.from"),
        )],
        Materialize::collection(WriteMode::Replace),
    );
    let project = Project::new("p", vec![enriched]).unwrap();

    let compiled = compile_in(&project, "enriched");
    assert_eq!(compiled.stages[0]["$lookup"]["from"], json!("users"));
}

#[test]
fn test_foreign_ephemeral_reference_inlines_into_sub_pipeline() {
    let eph = Model::new(
        "recent",
        Source::collection("events"),
        vec![Stage::new(json!({"$match": {"recent": true}}))],
    );
    let wide = Model::materialized(
        "wide",
        Source::collection("orders"),
        vec![Stage::with_foreign(
            json!({"$unionWith": {}}),
            ForeignSource::new(Source::model(&eph), "$unionWith.coll").with_pipeline(
                "$unionWith.pipeline",
                vec![Stage::new(json!({"$project": {"x": 1}}))],
            ),
        )],
        Materialize::collection(WriteMode::Replace),
    );
    let project = Project::new("p", vec![wide]).unwrap();

    let compiled = compile_in(&project, "wide");
    let union = &compiled.stages[0]["$unionWith"];
    // The union reads the base of the ephemeral chain; the chain's stages
    // run ahead of the declared sub-pipeline.
    assert_eq!(union["coll"], json!("events"));
    assert_eq!(
        union["pipeline"],
        json!([{"$match": {"recent": true}}, {"$project": {"x": 1}}])
    );
}

#[test]
fn test_foreign_ephemeral_without_pipeline_slot_is_rejected() {
    let eph = Model::new(
        "recent",
        Source::collection("events"),
        vec![Stage::new(json!({"$match": {"recent": true}}))],
    );
    let wide = Model::materialized(
        "wide",
        Source::collection("orders"),
        vec![Stage::with_foreign(
            json!({"$graphLookup": {"as": "g"}}),
            ForeignSource::new(Source::model(&eph), "$graphLookup.from"),
        )],
        Materialize::collection(WriteMode::Replace),
    );
    let project = Project::new("p", vec![wide]).unwrap();

    let model = project.get_model("wide").unwrap();
    let err = compile_model(model, project.models()).unwrap_err();
    match err {
        CoreError::EphemeralReference { name, .. } => assert_eq!(name, "recent"),
        other => panic!("expected EphemeralReference, got {:?}", other),
    }
}

#[test]
fn test_foreign_ephemeral_with_empty_chain_needs_no_slot() {
    // An ephemeral with no stages resolves to its base collection alone.
    let passthrough = Model::new("passthrough", Source::collection("events"), vec![]);
    let wide = Model::materialized(
        "wide",
        Source::collection("orders"),
        vec![Stage::with_foreign(
            json!({"$unionWith": {}}),
            ForeignSource::new(Source::model(&passthrough), "$unionWith.coll"),
        )],
        Materialize::collection(WriteMode::Replace),
    );
    let project = Project::new("p", vec![wide]).unwrap();

    let compiled = compile_in(&project, "wide");
    assert_eq!(compiled.stages[0]["$unionWith"]["coll"], json!("events"));
}

#[test]
fn test_named_reference_resolves_through_registry() {
    let base = table("base", Source::collection("raw"));
    let late = table("late", Source::model_named("base"));
    let project = Project::new("p", vec![base, late]).unwrap();

    let compiled = compile_in(&project, "late");
    assert_eq!(compiled.read_collection, "base");
}

#[test]
fn test_output_action_is_attached_not_appended() {
    let model = table("facts", Source::collection("raw"));
    let project = Project::new("p", vec![model]).unwrap();

    let compiled = compile_in(&project, "facts");
    // The write stage lives in the action; the executor appends it.
    assert_eq!(compiled.stages.len(), 1);
    match compiled.action {
        OutputAction::WriteStage { stage, .. } => {
            assert_eq!(stage, json!({"$out": "facts"}));
        }
        other => panic!("expected WriteStage, got {:?}", other),
    }
}
