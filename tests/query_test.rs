//! Queries are created and executed entirely by listeners; these tests install a minimal
//! "children of a path" query language.

mod common;

use std::sync::Weak;
use test_log::test;

use common::*;
use document_manager::{
    context::ManagerContext,
    document::Document,
    error::{DocumentManagerError, Result},
    event::{QueryCreateBuilderEvent, QueryCreateEvent, QueryExecuteEvent},
    manager::DocumentManager,
    options::Options,
    query::{Query, QueryBuilder, DEFAULT_QUERY_LANGUAGE},
};

struct ChildrenQueryBuilder {
    parent: String,
    max_results: Option<usize>,
    context: Weak<ManagerContext>,
}

impl QueryBuilder for ChildrenQueryBuilder {
    fn get_query(&self) -> Result<Query> {
        let context = self.context.upgrade().ok_or(DocumentManagerError::Detached)?;
        let mut query = Query::new(self.parent.clone(), None, Options::default(), &context)
            .with_language("children");
        query.set_max_results(self.max_results);
        Ok(query)
    }
}

fn create_query(event: &mut QueryCreateEvent, context: &ManagerContext) -> Result<()> {
    event.query = Some(
        Query::new(
            event.statement.clone(),
            event.locale.clone(),
            event.options.clone(),
            context,
        )
        .with_primary_selector("c"),
    );
    Ok(())
}

fn create_builder(event: &mut QueryCreateBuilderEvent, context: &ManagerContext) -> Result<()> {
    event.builder = Some(Box::new(ChildrenQueryBuilder {
        parent: "/cmf".to_string(),
        max_results: Some(1),
        context: context.weak(),
    }));
    Ok(())
}

fn execute_query(event: &mut QueryExecuteEvent, context: &ManagerContext) -> Result<()> {
    let locale = event.query.locale().unwrap_or("en").to_string();
    let parent = context.node_manager().find(event.query.statement())?;
    let mut documents = Vec::new();
    for child in parent.children()? {
        if event
            .query
            .max_results()
            .is_some_and(|max| documents.len() >= max)
        {
            break;
        }
        documents.push(context.hydrate(None, &child, &locale, event.query.options())?);
    }
    event.result = Some(documents);
    Ok(())
}

fn query_manager() -> DocumentManager {
    let (_session, builder) = test_builder();
    builder
        .listener::<QueryCreateEvent>(create_query)
        .listener::<QueryCreateBuilderEvent>(create_builder)
        .listener::<QueryExecuteEvent>(execute_query)
        .build()
        .unwrap()
}

fn titles(documents: &[Document]) -> Vec<String> {
    documents
        .iter()
        .map(|document| document.get_string("title").unwrap().unwrap_or_default())
        .collect()
}

#[test]
fn test_query_results_are_managed_documents() {
    let manager = query_manager();
    let one = create_page(&manager, "One", "/cmf", "en");
    create_page(&manager, "Two", "/cmf", "en");

    let query = manager
        .create_query("/cmf", Some("en"), Options::default())
        .unwrap();
    assert_eq!(query.language(), DEFAULT_QUERY_LANGUAGE);
    assert_eq!(query.primary_selector(), Some("c"));
    assert_eq!(query.locale(), Some("en"));

    let documents = query.execute().unwrap();
    assert_eq!(titles(&documents), vec!["One", "Two"]);
    assert_eq!(documents[0], one);

    // every execution reads the live tree
    create_page(&manager, "Three", "/cmf", "en");
    assert_eq!(query.execute().unwrap().len(), 3);
}

#[test]
fn test_query_builder_from_listener() {
    let manager = query_manager();
    create_page(&manager, "First", "/cmf", "en");
    create_page(&manager, "Second", "/cmf", "en");

    let builder = manager.create_query_builder().unwrap();
    let query = builder.get_query().unwrap();
    assert_eq!(query.language(), "children");
    assert_eq!(query.max_results(), Some(1));
    assert_eq!(titles(&query.execute().unwrap()), vec!["First"]);
}

#[test]
fn test_queries_without_listeners_fail() {
    let (_session, manager) = test_manager();
    assert!(matches!(
        manager.create_query("/cmf", None, Options::default()),
        Err(DocumentManagerError::Structural(_))
    ));
    assert!(matches!(
        manager.create_query_builder(),
        Err(DocumentManagerError::Structural(_))
    ));
}

#[test]
fn test_query_of_dropped_manager_is_detached() {
    let manager = query_manager();
    let query = manager
        .create_query("/cmf", None, Options::default())
        .unwrap();
    drop(manager);
    assert_eq!(query.execute().unwrap_err(), DocumentManagerError::Detached);
}

#[test]
fn test_query_results_share_the_identity_map() {
    let manager = query_manager();
    create_page(&manager, "Shared", "/cmf", "en");
    manager.flush().unwrap();
    manager.clear().unwrap();

    let query = manager
        .create_query("/cmf", Some("en"), Options::default())
        .unwrap();
    let from_query = query.execute().unwrap();
    let found = manager.find("/cmf/shared", "en", Options::default()).unwrap();
    assert_eq!(from_query, vec![found]);
}
