use std::{
    fmt::{self, Debug, Formatter},
    sync::Weak,
};

use crate::{
    context::ManagerContext,
    document::Document,
    error::{DocumentManagerError, Result},
    event::QueryExecuteEvent,
    options::Options,
};

pub const DEFAULT_QUERY_LANGUAGE: &str = "JCR-SQL2";

/// A statement created by a `QueryCreate` listener. Executing it hands it to the
/// `QueryExecute` listeners of the manager that created it, which turn raw results into
/// documents.
#[derive(Clone)]
pub struct Query {
    statement: String,
    language: String,
    locale: Option<String>,
    primary_selector: Option<String>,
    first_result: Option<usize>,
    max_results: Option<usize>,
    options: Options,
    context: Weak<ManagerContext>,
}

impl Query {
    pub fn new<S: Into<String>>(
        statement: S,
        locale: Option<String>,
        options: Options,
        context: &ManagerContext,
    ) -> Self {
        Query {
            statement: statement.into(),
            language: DEFAULT_QUERY_LANGUAGE.to_string(),
            locale,
            primary_selector: None,
            first_result: None,
            max_results: None,
            options,
            context: context.weak(),
        }
    }

    pub fn with_language<S: Into<String>>(mut self, language: S) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_primary_selector<S: Into<String>>(mut self, selector: S) -> Self {
        self.primary_selector = Some(selector.into());
        self
    }

    pub fn set_first_result(&mut self, first_result: Option<usize>) {
        self.first_result = first_result;
    }

    pub fn set_max_results(&mut self, max_results: Option<usize>) {
        self.max_results = max_results;
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    pub fn primary_selector(&self) -> Option<&str> {
        self.primary_selector.as_deref()
    }

    pub fn first_result(&self) -> Option<usize> {
        self.first_result
    }

    pub fn max_results(&self) -> Option<usize> {
        self.max_results
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn execute(&self) -> Result<Vec<Document>> {
        let context = self.context.upgrade().ok_or(DocumentManagerError::Detached)?;
        tracing::debug!("[Query] executing \"{}\"", self.statement);
        let mut event = QueryExecuteEvent::new(self.clone());
        context.dispatch(&mut event)?;
        event.take_result()
    }
}

impl Debug for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("statement", &self.statement)
            .field("language", &self.language)
            .field("locale", &self.locale)
            .field("first_result", &self.first_result)
            .field("max_results", &self.max_results)
            .finish()
    }
}

/// Incrementally assembles a [`Query`]. Implementations come from `QueryCreateBuilder`
/// listeners.
pub trait QueryBuilder: Send {
    fn get_query(&self) -> Result<Query>;
}
