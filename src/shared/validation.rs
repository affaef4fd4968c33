/**
 * Validation Layer
 *
 * Turns an arbitrary JSON payload claiming to be a document or an
 * operation batch into a fully checked value, or rejects it with every
 * violated field listed as `{path, message}`. Nothing is partially
 * accepted: one bad operation rejects the whole batch.
 *
 * # Constraints
 *
 * - geometry fields are non-negative integers; `width`/`height` are at least 1
 * - colors match `#rgb`, `#rrggbb`, `transparent` or a small named set
 * - `alignment`, `textAlign` and `fontWeight` use closed vocabularies
 * - the node `type` decides which further fields are required
 * - attributes outside the node schema are rejected, never dropped
 * - a patch may not clear `text` or `src`
 *
 * Checks run on the raw `serde_json::Value` so that every problem is
 * reported at once; the typed value is only deserialized after the
 * payload is known to be clean.
 */

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::shared::document::{Document, MAX_STAGE_DIMENSION, SCHEMA_VERSION};
use crate::shared::error::{FieldIssue, ValidationError};
use crate::shared::node::{is_valid_color, Alignment, FontWeight, NodeKind, TextAlign};
use crate::shared::operation::Operation;

const OPERATION_TYPES: [&str; 7] = [
    "add",
    "update",
    "remove",
    "reorder",
    "reparent",
    "addChild",
    "removeChild",
];

/// Attributes an `update` may never touch
const UNPATCHABLE: [&str; 3] = ["id", "type", "parentId"];

/// Every attribute a node may carry on the wire
const NODE_ATTRIBUTES: [&str; 20] = [
    "id",
    "type",
    "x",
    "y",
    "width",
    "height",
    "fill",
    "stroke",
    "strokeWidth",
    "cornerRadius",
    "text",
    "fontSize",
    "fontWeight",
    "textAlign",
    "label",
    "src",
    "rotation",
    "parentId",
    "children",
    "alignment",
];

/// Patch values that would leave a text or image node without its content
const NON_EMPTY_IN_PATCH: [&str; 2] = ["text", "src"];

/// Validate an operation batch
///
/// The batch must be a non-empty JSON array. Issue paths are relative to
/// the array, e.g. `[1].node.width`.
pub fn validate_operations(value: &Value) -> Result<Vec<Operation>, ValidationError> {
    let mut issues = Vec::new();

    let Some(items) = value.as_array() else {
        return Err(ValidationError::single("", "expected an array of operations"));
    };
    if items.is_empty() {
        return Err(ValidationError::single("", "must contain at least one operation"));
    }

    let mut added = HashSet::new();
    for (index, item) in items.iter().enumerate() {
        let path = format!("[{}]", index);
        check_operation(item, &path, &mut added, &mut issues);
    }

    finish(issues, value)
}

/// Validate a full document, migrating older schema versions first
pub fn validate_document(value: &Value) -> Result<Document, ValidationError> {
    let mut value = value.clone();
    let mut issues = Vec::new();

    let Some(object) = value.as_object_mut() else {
        return Err(ValidationError::single("", "expected a document object"));
    };
    migrate_document(object, &mut issues);
    if !issues.is_empty() {
        return Err(ValidationError::new(issues));
    }

    check_non_empty_string(object, "id", "", true, &mut issues);
    check_optional_string(object, "title", "", &mut issues);
    for field in ["width", "height"] {
        if let Some(size) = check_uint(object, field, "", 1, true, &mut issues) {
            if size > u64::from(MAX_STAGE_DIMENSION) {
                issues.push(FieldIssue::new(
                    field,
                    format!("must be at most {}", MAX_STAGE_DIMENSION),
                ));
            }
        }
    }
    check_u64(object, "version", "", &mut issues);
    for field in ["createdAt", "updatedAt"] {
        match object.get(field) {
            Some(Value::String(raw)) if DateTime::parse_from_rfc3339(raw).is_ok() => {}
            Some(_) => issues.push(FieldIssue::new(field, "must be an RFC 3339 timestamp")),
            None => issues.push(FieldIssue::new(field, "is required")),
        }
    }

    match object.get("nodes") {
        Some(Value::Array(nodes)) => {
            let mut seen = HashSet::new();
            for (index, node) in nodes.iter().enumerate() {
                let path = format!("nodes[{}]", index);
                check_node(node, &path, &mut issues);
                if let Some(id) = node.get("id").and_then(Value::as_str) {
                    if !seen.insert(id.to_string()) {
                        issues.push(FieldIssue::new(
                            format!("{}.id", path),
                            format!("duplicate node id '{}'", id),
                        ));
                    }
                }
            }
        }
        Some(_) => issues.push(FieldIssue::new("nodes", "must be an array")),
        None => issues.push(FieldIssue::new("nodes", "is required")),
    }

    finish(issues, &value)
}

/// Bring a document payload up to [`SCHEMA_VERSION`]
///
/// Schema 0 predates the `schemaVersion`, `version` and timestamp fields;
/// they are stamped with defaults. Newer schemas are refused.
fn migrate_document(object: &mut Map<String, Value>, issues: &mut Vec<FieldIssue>) {
    let schema = match object.get("schemaVersion") {
        None | Some(Value::Null) => 0,
        Some(value) => match value.as_u64() {
            Some(schema) => schema,
            None => {
                issues.push(FieldIssue::new("schemaVersion", "must be a non-negative integer"));
                return;
            }
        },
    };

    if schema > u64::from(SCHEMA_VERSION) {
        issues.push(FieldIssue::new(
            "schemaVersion",
            format!("unsupported schema version {} (newest known is {})", schema, SCHEMA_VERSION),
        ));
        return;
    }

    if schema == 0 {
        tracing::debug!("[Validation] Migrating schema 0 document");
        let now = Value::String(Utc::now().to_rfc3339());
        object.entry("version").or_insert(Value::from(0u64));
        object.entry("createdAt").or_insert_with(|| now.clone());
        object.entry("updatedAt").or_insert(now);
        object.insert("schemaVersion".to_string(), Value::from(SCHEMA_VERSION));
    }
}

fn check_operation(item: &Value, path: &str, added: &mut HashSet<String>, issues: &mut Vec<FieldIssue>) {
    let Some(object) = item.as_object() else {
        issues.push(FieldIssue::new(path, "expected an operation object"));
        return;
    };

    let op_type = match object.get("type") {
        Some(Value::String(op_type)) if OPERATION_TYPES.contains(&op_type.as_str()) => op_type.as_str(),
        Some(Value::String(other)) => {
            issues.push(FieldIssue::new(
                join(path, "type"),
                format!("unknown operation type '{}'", other),
            ));
            return;
        }
        _ => {
            issues.push(FieldIssue::new(join(path, "type"), "is required"));
            return;
        }
    };

    match op_type {
        "add" => match object.get("node") {
            Some(node) => {
                let node_path = join(path, "node");
                check_node(node, &node_path, issues);
                if let Some(id) = node.get("id").and_then(Value::as_str) {
                    if !added.insert(id.to_string()) {
                        issues.push(FieldIssue::new(
                            join(&node_path, "id"),
                            format!("node '{}' is added more than once in this batch", id),
                        ));
                    }
                }
            }
            None => issues.push(FieldIssue::new(join(path, "node"), "is required")),
        },
        "update" => {
            check_non_empty_string(object, "id", path, true, issues);
            match object.get("patch") {
                Some(Value::Object(patch)) => check_patch(patch, &join(path, "patch"), issues),
                Some(_) => issues.push(FieldIssue::new(join(path, "patch"), "must be an object")),
                None => issues.push(FieldIssue::new(join(path, "patch"), "is required")),
            }
        }
        "remove" => {
            check_non_empty_string(object, "id", path, true, issues);
        }
        "reorder" => {
            check_non_empty_string(object, "id", path, true, issues);
            check_uint(object, "zIndex", path, 0, true, issues);
        }
        "reparent" => {
            let id = check_non_empty_string(object, "id", path, true, issues);
            let parent = match object.get("parentId") {
                None | Some(Value::Null) => None,
                Some(_) => check_non_empty_string(object, "parentId", path, true, issues),
            };
            if id.is_some() && id == parent {
                issues.push(FieldIssue::new(join(path, "parentId"), "a node cannot be its own parent"));
            }
        }
        _ => {
            let parent = check_non_empty_string(object, "parentId", path, true, issues);
            let child = check_non_empty_string(object, "childId", path, true, issues);
            if op_type == "addChild" && parent.is_some() && parent == child {
                issues.push(FieldIssue::new(join(path, "childId"), "a node cannot be its own child"));
            }
        }
    }
}

fn check_node(value: &Value, path: &str, issues: &mut Vec<FieldIssue>) {
    let Some(object) = value.as_object() else {
        issues.push(FieldIssue::new(path, "expected a node object"));
        return;
    };

    let id = check_non_empty_string(object, "id", path, true, issues);
    let kind = match object.get("type") {
        Some(Value::String(tag)) => match NodeKind::parse(tag) {
            Some(kind) => Some(kind),
            None => {
                issues.push(FieldIssue::new(
                    join(path, "type"),
                    format!("must be one of {}", NodeKind::ALL.join(", ")),
                ));
                None
            }
        },
        Some(_) => {
            issues.push(FieldIssue::new(join(path, "type"), "must be a string"));
            None
        }
        None => {
            issues.push(FieldIssue::new(join(path, "type"), "is required"));
            None
        }
    };

    check_known_attributes(object, path, issues);
    check_uint(object, "x", path, 0, true, issues);
    check_uint(object, "y", path, 0, true, issues);
    check_uint(object, "width", path, 1, true, issues);
    check_uint(object, "height", path, 1, true, issues);
    check_attributes(object, path, issues);

    match object.get("parentId") {
        None | Some(Value::Null) => {}
        Some(Value::String(parent)) if Some(parent.as_str()) == id.as_deref() => {
            issues.push(FieldIssue::new(join(path, "parentId"), "a node cannot be its own parent"));
        }
        Some(_) => {
            check_non_empty_string(object, "parentId", path, true, issues);
        }
    }
    if let Some(children) = object.get("children") {
        check_children(children, id.as_deref(), &join(path, "children"), issues);
    }

    if let Some(kind) = kind {
        for field in kind.required_fields() {
            let present = match object.get(*field) {
                Some(Value::String(text)) => !text.is_empty(),
                Some(Value::Null) | None => false,
                Some(_) => true,
            };
            if !present {
                issues.push(FieldIssue::new(
                    join(path, field),
                    format!("is required for type '{}'", tag_of(kind)),
                ));
            }
        }
    }
}

fn check_patch(patch: &Map<String, Value>, path: &str, issues: &mut Vec<FieldIssue>) {
    if patch.values().all(Value::is_null) {
        issues.push(FieldIssue::new(path, "must change at least one attribute"));
        return;
    }
    for field in UNPATCHABLE {
        if patch.contains_key(field) {
            issues.push(FieldIssue::new(join(path, field), "cannot be patched"));
        }
    }
    check_known_attributes(patch, path, issues);
    for field in NON_EMPTY_IN_PATCH {
        if matches!(patch.get(field), Some(Value::String(value)) if value.is_empty()) {
            issues.push(FieldIssue::new(join(path, field), "must not be empty"));
        }
    }
    check_uint(patch, "x", path, 0, false, issues);
    check_uint(patch, "y", path, 0, false, issues);
    check_uint(patch, "width", path, 1, false, issues);
    check_uint(patch, "height", path, 1, false, issues);
    check_attributes(patch, path, issues);
    if let Some(children) = patch.get("children") {
        check_children(children, None, &join(path, "children"), issues);
    }
}

fn check_known_attributes(object: &Map<String, Value>, path: &str, issues: &mut Vec<FieldIssue>) {
    for key in object.keys() {
        if !NODE_ATTRIBUTES.contains(&key.as_str()) {
            issues.push(FieldIssue::new(join(path, key), "unknown attribute"));
        }
    }
}

/// Optional attributes shared by nodes and patches
fn check_attributes(object: &Map<String, Value>, path: &str, issues: &mut Vec<FieldIssue>) {
    for field in ["fill", "stroke"] {
        match object.get(field) {
            None | Some(Value::Null) => {}
            Some(Value::String(color)) if is_valid_color(color) => {}
            Some(_) => issues.push(FieldIssue::new(
                join(path, field),
                "must be a hex color (#rgb or #rrggbb), 'transparent', or a named color",
            )),
        }
    }
    check_uint(object, "strokeWidth", path, 0, false, issues);
    check_uint(object, "cornerRadius", path, 0, false, issues);
    check_uint(object, "fontSize", path, 1, false, issues);
    for field in ["text", "label", "src"] {
        check_optional_string(object, field, path, issues);
    }
    check_vocabulary(object, "fontWeight", &FontWeight::ALL, path, issues);
    check_vocabulary(object, "textAlign", &TextAlign::ALL, path, issues);
    check_vocabulary(object, "alignment", &Alignment::ALL, path, issues);
    match object.get("rotation") {
        None | Some(Value::Null) | Some(Value::Number(_)) => {}
        Some(_) => issues.push(FieldIssue::new(join(path, "rotation"), "must be a number")),
    }
}

fn check_children(value: &Value, owner: Option<&str>, path: &str, issues: &mut Vec<FieldIssue>) {
    let Some(items) = value.as_array() else {
        issues.push(FieldIssue::new(path, "must be an array of node ids"));
        return;
    };
    let mut seen = HashSet::new();
    for (index, item) in items.iter().enumerate() {
        let item_path = format!("{}[{}]", path, index);
        match item.as_str() {
            Some("") | None => issues.push(FieldIssue::new(item_path, "must be a non-empty string")),
            Some(id) if Some(id) == owner => {
                issues.push(FieldIssue::new(item_path, "a node cannot be its own child"))
            }
            Some(id) => {
                if !seen.insert(id) {
                    issues.push(FieldIssue::new(item_path, format!("duplicate child id '{}'", id)));
                }
            }
        }
    }
}

fn check_non_empty_string(
    object: &Map<String, Value>,
    field: &str,
    path: &str,
    required: bool,
    issues: &mut Vec<FieldIssue>,
) -> Option<String> {
    match object.get(field) {
        Some(Value::String(value)) if !value.is_empty() => Some(value.clone()),
        Some(Value::String(_)) => {
            issues.push(FieldIssue::new(join(path, field), "must not be empty"));
            None
        }
        Some(_) => {
            issues.push(FieldIssue::new(join(path, field), "must be a string"));
            None
        }
        None => {
            if required {
                issues.push(FieldIssue::new(join(path, field), "is required"));
            }
            None
        }
    }
}

fn check_optional_string(object: &Map<String, Value>, field: &str, path: &str, issues: &mut Vec<FieldIssue>) {
    match object.get(field) {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(_) => issues.push(FieldIssue::new(join(path, field), "must be a string")),
    }
}

/// Check an integer field that must fit in `u32` and be at least `min`
fn check_uint(
    object: &Map<String, Value>,
    field: &str,
    path: &str,
    min: u64,
    required: bool,
    issues: &mut Vec<FieldIssue>,
) -> Option<u64> {
    let value = match object.get(field) {
        Some(Value::Null) | None => {
            if required {
                issues.push(FieldIssue::new(join(path, field), "is required"));
            }
            return None;
        }
        Some(value) => value,
    };

    let message = if min == 0 {
        "must be a non-negative integer".to_string()
    } else {
        format!("must be an integer of at least {}", min)
    };
    match value.as_u64() {
        Some(number) if number >= min && number <= u64::from(u32::MAX) => Some(number),
        _ => {
            issues.push(FieldIssue::new(join(path, field), message));
            None
        }
    }
}

fn check_u64(object: &Map<String, Value>, field: &str, path: &str, issues: &mut Vec<FieldIssue>) {
    if object.get(field).and_then(Value::as_u64).is_none() {
        issues.push(FieldIssue::new(join(path, field), "must be a non-negative integer"));
    }
}

fn check_vocabulary(
    object: &Map<String, Value>,
    field: &str,
    allowed: &[&str],
    path: &str,
    issues: &mut Vec<FieldIssue>,
) {
    match object.get(field) {
        None | Some(Value::Null) => {}
        Some(Value::String(value)) if allowed.contains(&value.as_str()) => {}
        Some(_) => issues.push(FieldIssue::new(
            join(path, field),
            format!("must be one of {}", allowed.join(", ")),
        )),
    }
}

/// Deserialize a payload that passed every check
fn finish<T: serde::de::DeserializeOwned>(issues: Vec<FieldIssue>, value: &Value) -> Result<T, ValidationError> {
    if !issues.is_empty() {
        return Err(ValidationError::new(issues));
    }
    T::deserialize(value).map_err(|err| ValidationError::single("", err.to_string()))
}

fn join(path: &str, field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", path, field)
    }
}

fn tag_of(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Rect => "rect",
        NodeKind::Ellipse => "ellipse",
        NodeKind::Text => "text",
        NodeKind::Image => "image",
        NodeKind::Frame => "frame",
    }
}
