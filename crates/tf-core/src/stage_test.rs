use super::*;
use crate::model::Model;
use serde_json::json;

#[test]
fn test_plain_stage_has_no_foreign_source() {
    let stage = Stage::new(json!({"$match": {"status": "active"}}));
    assert!(stage.foreign().is_none());
    assert!(referenced_sources(&[stage]).is_empty());
}

#[test]
fn test_foreign_source_is_collected() {
    let stage = Stage::with_foreign(
        json!({"$lookup": {"localField": "user_id", "foreignField": "_id", "as": "user"}}),
        ForeignSource::new(Source::collection("users"), "$lookup.from"),
    );
    let binding = [stage];
    let sources = referenced_sources(&binding);
    assert_eq!(sources.len(), 1);
    assert!(sources[0].model_name().is_none());
}

#[test]
fn test_nested_sub_pipeline_references_are_collected() {
    let inner = Model::new("inner", Source::collection("raw"), vec![]);
    let outer = Model::new("outer", Source::collection("raw"), vec![]);

    let nested = Stage::with_foreign(
        json!({"$lookup": {"as": "i"}}),
        ForeignSource::new(Source::model(&inner), "$lookup.from"),
    );
    let stage = Stage::with_foreign(
        json!({"$unionWith": {}}),
        ForeignSource::new(Source::model(&outer), "$unionWith.coll")
            .with_pipeline("$unionWith.pipeline", vec![nested]),
    );

    let binding = [stage];
    let names: Vec<&str> = referenced_sources(&binding)
        .iter()
        .filter_map(|s| s.model_name())
        .map(|n| n.as_str())
        .collect();
    assert_eq!(names, vec!["outer", "inner"]);
}

#[test]
fn test_set_body_field_nested_path() {
    let mut body = json!({"$lookup": {"as": "user"}});
    set_body_field(&mut body, "$lookup.from", json!("users"));
    assert_eq!(body, json!({"$lookup": {"as": "user", "from": "users"}}));
}

#[test]
fn test_set_body_field_creates_intermediate_objects() {
    let mut body = json!({});
    set_body_field(&mut body, "$unionWith.coll", json!("events"));
    assert_eq!(body, json!({"$unionWith": {"coll": "events"}}));
}

#[test]
fn test_set_body_field_overwrites_existing() {
    let mut body = json!({"$lookup": {"from": "placeholder"}});
    set_body_field(&mut body, "$lookup.from", json!("orders"));
    assert_eq!(body["$lookup"]["from"], json!("orders"));
}
