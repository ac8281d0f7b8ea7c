//! Property tests for file extraction.

use std::collections::BTreeMap;

use proptest::prelude::*;
use serde_json::Value;
use upload_link::graphql::PathSegment;
use upload_link::{Blob, Upload, UploadValue, extract_files};

#[derive(Clone, Debug)]
enum Shape {
    Null,
    Bool(bool),
    Int(i32),
    Str(String),
    File(String),
    List(Vec<Shape>),
    Object(BTreeMap<String, Shape>),
}

impl Shape {
    fn to_value(&self) -> UploadValue {
        match self {
            Shape::Null => UploadValue::Null,
            Shape::Bool(b) => UploadValue::from(*b),
            Shape::Int(i) => UploadValue::from(*i),
            Shape::Str(s) => UploadValue::from(s.as_str()),
            Shape::File(name) => UploadValue::from(Blob::new(name.clone(), name.clone())),
            Shape::List(items) => items.iter().map(Shape::to_value).collect::<Vec<_>>().into(),
            Shape::Object(fields) => fields
                .iter()
                .map(|(key, value)| (key.clone(), value.to_value()))
                .collect(),
        }
    }

    fn to_nulled_json(&self) -> Value {
        match self {
            Shape::Null | Shape::File(_) => Value::Null,
            Shape::Bool(b) => Value::from(*b),
            Shape::Int(i) => Value::from(*i),
            Shape::Str(s) => Value::from(s.as_str()),
            Shape::List(items) => Value::Array(items.iter().map(Shape::to_nulled_json).collect()),
            Shape::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_nulled_json()))
                    .collect(),
            ),
        }
    }

    fn files_in_order(&self, out: &mut Vec<String>) {
        match self {
            Shape::File(name) => out.push(name.clone()),
            Shape::List(items) => items.iter().for_each(|item| item.files_in_order(out)),
            Shape::Object(fields) => fields.values().for_each(|value| value.files_in_order(out)),
            _ => {}
        }
    }

    fn at(&self, path: &[PathSegment]) -> Option<&Shape> {
        path.iter().try_fold(self, |node, segment| match (node, segment) {
            (Shape::List(items), PathSegment::Index(idx)) => items.get(*idx),
            (Shape::Object(fields), PathSegment::Field(key)) => fields.get(key),
            _ => None,
        })
    }
}

fn shape() -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![
        Just(Shape::Null),
        any::<bool>().prop_map(Shape::Bool),
        any::<i32>().prop_map(Shape::Int),
        "[a-z ]{0,8}".prop_map(Shape::Str),
        "[a-z]{1,6}\\.bin".prop_map(Shape::File),
    ];
    leaf.prop_recursive(4, 64, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Shape::List),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..6).prop_map(Shape::Object),
        ]
    })
}

fn blob_name(upload: &Upload) -> &str {
    match upload {
        Upload::Blob(blob) => blob.name(),
        other => panic!("unexpected upload: {other:?}"),
    }
}

proptest! {
    #[test]
    fn test_extraction_nulls_files_and_keeps_structure(shape in shape()) {
        let mut value = shape.to_value();
        let files = extract_files(&mut value);

        let mut expected = Vec::new();
        shape.files_in_order(&mut expected);
        let found: Vec<_> = files.iter().map(|f| blob_name(&f.file).to_string()).collect();
        prop_assert_eq!(found, expected);

        prop_assert_eq!(value.to_json(), Some(shape.to_nulled_json()));
    }

    #[test]
    fn test_recorded_paths_point_at_the_files(shape in shape()) {
        let mut value = shape.to_value();
        let files = extract_files(&mut value);

        for file in &files {
            match shape.at(&file.path) {
                Some(Shape::File(name)) => prop_assert_eq!(name.as_str(), blob_name(&file.file)),
                other => prop_assert!(false, "path {:?} points at {:?}", file.path, other),
            }
            prop_assert!(value.pointer_mut(&file.path).is_some_and(|slot| slot.is_null()));
        }
    }

    #[test]
    fn test_reinserting_files_round_trips(shape in shape()) {
        let mut value = shape.to_value();
        let files = extract_files(&mut value);
        let paths: Vec<_> = files.iter().map(|f| f.path.clone()).collect();

        for file in files {
            let slot = value.pointer_mut(&file.path).expect("path exists after extraction");
            *slot = UploadValue::from(file.file);
        }

        let again = extract_files(&mut value);
        let again_paths: Vec<_> = again.iter().map(|f| f.path.clone()).collect();
        prop_assert_eq!(again_paths, paths);
        prop_assert_eq!(value.to_json(), Some(shape.to_nulled_json()));
    }
}

#[test]
fn test_tree_without_files_is_untouched() {
    let mut value = UploadValue::from(serde_json::json!({
        "a": [1, {"b": null}],
        "c": "text"
    }));
    let before = value.to_json();
    assert!(extract_files(&mut value).is_empty());
    assert_eq!(value.to_json(), before);
}
