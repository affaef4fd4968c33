//! Custom assertion macros and utilities
//!
//! Provides assertion macros with more descriptive failure output, plus a
//! structural check of the document hierarchy.

use xfcanvas::shared::Document;

/// Assert that a result is ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($result:expr, $message:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("{}: {:?}", $message, e),
        }
    };
}

/// Assert that a result is an error
#[macro_export]
macro_rules! assert_err {
    ($result:expr) => {
        assert!($result.is_err(), "Expected Err, got Ok");
    };
    ($result:expr, $pattern:pat) => {
        match $result {
            Err($pattern) => {}
            Ok(value) => panic!("Expected Err, got Ok: {:?}", value),
            Err(e) => panic!("Expected different error variant, got: {:?}", e),
        }
    };
}

/// Assert that a string contains a substring
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        assert!(
            $haystack.contains($needle),
            "Expected '{}' to contain '{}'",
            $haystack,
            $needle
        );
    };
}

/// Check every hierarchy invariant, returning the first violation
///
/// - listed children exist and are listed by exactly one node
/// - a node's `parentId` names the node listing it, and only that node
/// - following `parentId` from any node reaches a root
pub fn hierarchy_violation(doc: &Document) -> Option<String> {
    let mut owners = std::collections::HashMap::new();
    for node in doc.nodes.values() {
        for child in node.child_ids() {
            if !doc.contains(child) {
                return Some(format!("{} lists missing child {}", node.id, child));
            }
            if child == &node.id {
                return Some(format!("{} lists itself", node.id));
            }
            if let Some(previous) = owners.insert(child.clone(), node.id.clone()) {
                return Some(format!("{} is listed by both {} and {}", child, previous, node.id));
            }
        }
    }

    for node in doc.nodes.values() {
        if node.parent_id.as_ref() != owners.get(&node.id) {
            return Some(format!(
                "{} has parentId {:?} but is listed by {:?}",
                node.id,
                node.parent_id,
                owners.get(&node.id)
            ));
        }

        let mut cursor = node.parent_id.as_deref();
        let mut steps = 0;
        while let Some(parent) = cursor {
            steps += 1;
            if steps > doc.len() {
                return Some(format!("cycle above {}", node.id));
            }
            cursor = doc.node(parent).and_then(|p| p.parent_id.as_deref());
        }
    }
    None
}

/// Assert that a document's hierarchy is consistent
#[macro_export]
macro_rules! assert_hierarchy_consistent {
    ($doc:expr) => {
        if let Some(violation) = $crate::common::assertions::hierarchy_violation(&$doc) {
            panic!("hierarchy violated: {}", violation);
        }
    };
}
