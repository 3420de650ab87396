//! Tests for DocumentInspector queries on managed and unmanaged documents

use super::helpers::*;
use crate::{
    document::Document,
    error::DocumentManagerError,
    metadata::{Behavior, UNKNOWN_DOCUMENT_CLASS},
    options::Options,
};
use test_log::test;

#[test]
fn test_structure_queries() {
    let (_session, manager) = create_test_manager();
    let parent = create_page(&manager, "Parent", "/cmf", "en");
    let child = manager.create("page").unwrap();
    child.set("title", "Child Page").unwrap();
    child.set_parent(Some(parent.clone())).unwrap();
    manager.persist(&child, "en", Options::default()).unwrap();

    let inspector = manager.inspector();
    assert_eq!(inspector.get_path(&child).unwrap(), "/cmf/parent/child-page");
    assert_eq!(inspector.get_name(&child).unwrap(), "child-page");
    assert_eq!(inspector.get_depth(&child).unwrap(), 3);
    assert_eq!(inspector.get_depth(&parent).unwrap(), 2);
    assert!(inspector.has_children(&parent).unwrap());
    assert!(!inspector.has_children(&child).unwrap());

    let node = inspector.get_node(&child).unwrap();
    assert_eq!(inspector.get_uuid(&child).unwrap(), node.identifier().to_string());
    assert_eq!(
        child.get_string("uuid").unwrap(),
        Some(node.identifier().to_string())
    );

    assert_eq!(inspector.get_parent(&child).unwrap(), Some(parent.clone()));
    let children = inspector
        .get_children(&parent, &Options::default())
        .unwrap()
        .to_vec()
        .unwrap();
    assert_eq!(children, vec![child]);
}

#[test]
fn test_parent_of_top_level_document_is_unknown_document() {
    let (_session, manager) = create_test_manager();
    let page = create_page(&manager, "Top", "/cmf", "en");

    let inspector = manager.inspector();
    let cmf = inspector.get_parent(&page).unwrap().unwrap();
    assert_eq!(cmf.class(), UNKNOWN_DOCUMENT_CLASS);
    assert_eq!(inspector.get_path(&cmf).unwrap(), "/cmf");

    let metadata = inspector.get_metadata(&cmf).unwrap();
    assert_eq!(metadata.alias(), None);
    assert!(metadata.has_behavior(Behavior::Parent));

    let root = inspector.get_parent(&cmf).unwrap().unwrap();
    assert_eq!(inspector.get_path(&root).unwrap(), "/");
    assert_eq!(inspector.get_parent(&root).unwrap(), None);
}

#[test]
fn test_locales_and_metadata() {
    let (_session, manager) = create_test_manager();
    let page = create_page(&manager, "Localized", "/cmf", "de");

    let inspector = manager.inspector();
    assert_eq!(inspector.get_locale(&page).unwrap(), "de");
    assert_eq!(inspector.get_original_locale(&page).unwrap(), "de");
    assert_eq!(page.get_string("locale").unwrap().as_deref(), Some("de"));

    let metadata = inspector.get_metadata(&page).unwrap();
    assert_eq!(metadata.alias(), Some("page"));
    assert_eq!(metadata.class(), "PageDocument");
    assert_eq!(metadata.phpcr_type(), Some("sulu:page"));
}

#[test]
fn test_unmanaged_document_is_rejected() {
    let (_session, manager) = create_test_manager();
    create_page(&manager, "Managed", "/cmf", "en");
    let stray = Document::new("PageDocument");

    let inspector = manager.inspector();
    for err in [
        inspector.get_path(&stray).unwrap_err(),
        inspector.get_locale(&stray).unwrap_err(),
        inspector.get_metadata(&stray).unwrap_err(),
    ] {
        assert!(
            matches!(err, DocumentManagerError::NotManaged { managed, .. } if managed == 1),
            "unexpected error: {err}"
        );
    }
}
