//! Tantivy-based search index module.
//!
//! Full-text search over task titles and descriptions. Every document also
//! carries the identities allowed to see the task, so a query only ever
//! matches tasks visible to the caller.

use std::path::Path;
use std::sync::Arc;
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{BooleanQuery, Occur, Query, QueryParser, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Schema, Value, STORED, STRING, TEXT};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::{Task, User};

const BOOST_TITLE: f32 = 3.0;
const BOOST_DESCRIPTION: f32 = 1.0;

/// Search result with task id and relevance score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub task_id: String,
    pub score: f32,
}

/// One page of hits plus the number of matching documents.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub hits: Vec<SearchResult>,
    pub total: usize,
}

/// Search index schema fields.
struct SearchFields {
    task_id: Field,
    title: Field,
    description: Field,
    viewers: Field,
}

/// Tantivy search index for tasks.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Arc<RwLock<IndexWriter>>,
    fields: SearchFields,
}

impl SearchIndex {
    /// Create or open a search index at the specified path.
    pub fn open(index_path: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(index_path)
            .map_err(|e| AppError::Search(format!("Failed to create index directory: {}", e)))?;

        let mut schema_builder = Schema::builder();
        let task_id = schema_builder.add_text_field("task_id", STRING | STORED);
        let title = schema_builder.add_text_field("title", TEXT);
        let description = schema_builder.add_text_field("description", TEXT);
        let viewers = schema_builder.add_text_field("viewers", STRING);
        let schema = schema_builder.build();

        let fields = SearchFields {
            task_id,
            title,
            description,
            viewers,
        };

        // Try to open existing index or create new one
        let index = Index::open_in_dir(index_path)
            .or_else(|_| Index::create_in_dir(index_path, schema.clone()))
            .map_err(|e| AppError::Search(format!("Failed to open/create index: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e| AppError::Search(format!("Failed to create reader: {}", e)))?;

        let writer = index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| AppError::Search(format!("Failed to create writer: {}", e)))?;

        Ok(Self {
            index,
            reader,
            writer: Arc::new(RwLock::new(writer)),
            fields,
        })
    }

    /// Rebuild the entire index from tasks.
    pub async fn rebuild(&self, tasks: &[Task]) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_all_documents()?;
        for task in tasks {
            writer.add_document(self.create_document(task))?;
        }
        writer.commit()?;

        self.reader.reload()?;

        tracing::info!("Search index rebuilt with {} tasks", tasks.len());
        Ok(())
    }

    /// Index a single task, replacing any previous version.
    pub async fn index_task(&self, task: &Task) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_term(Term::from_field_text(self.fields.task_id, &task.id));
        writer.add_document(self.create_document(task))?;
        writer.commit()?;

        self.reader.reload()?;
        Ok(())
    }

    /// Remove tasks from the index.
    pub async fn remove_tasks(&self, task_ids: &[String]) -> Result<(), AppError> {
        if task_ids.is_empty() {
            return Ok(());
        }
        let mut writer = self.writer.write().await;

        for task_id in task_ids {
            writer.delete_term(Term::from_field_text(self.fields.task_id, task_id));
        }
        writer.commit()?;

        self.reader.reload()?;
        Ok(())
    }

    /// Search tasks visible to `user`.
    ///
    /// The collector never asks for more documents than the index holds, so
    /// `limit` and `offset` may be arbitrary.
    pub fn search(
        &self,
        user: &User,
        query_str: &str,
        limit: usize,
        offset: usize,
    ) -> Result<SearchPage, AppError> {
        if query_str.trim().is_empty() {
            return Ok(SearchPage::default());
        }

        let searcher = self.reader.searcher();

        let mut query_parser =
            QueryParser::for_index(&self.index, vec![self.fields.title, self.fields.description]);
        query_parser.set_field_boost(self.fields.title, BOOST_TITLE);
        query_parser.set_field_boost(self.fields.description, BOOST_DESCRIPTION);

        // Free text from users; tolerate stray operators rather than failing
        let (text_query, errors) = query_parser.parse_query_lenient(query_str);
        if !errors.is_empty() {
            tracing::debug!("Lenient parse of {:?}: {} issue(s)", query_str, errors.len());
        }

        let viewer_terms: Vec<(Occur, Box<dyn Query>)> = [user.uid.clone(), user.email.to_lowercase()]
            .into_iter()
            .map(|identity| {
                let term = Term::from_field_text(self.fields.viewers, &identity);
                let query: Box<dyn Query> =
                    Box::new(TermQuery::new(term, IndexRecordOption::Basic));
                (Occur::Should, query)
            })
            .collect();

        let combined = BooleanQuery::new(vec![
            (Occur::Must, text_query),
            (Occur::Must, Box::new(BooleanQuery::new(viewer_terms))),
        ]);

        let num_docs = usize::try_from(searcher.num_docs()).unwrap_or(usize::MAX);
        let fetch = limit.saturating_add(offset).min(num_docs);

        // TopDocs rejects a zero limit; only the count is needed then
        if fetch == 0 || limit == 0 {
            let total = searcher
                .search(&combined, &Count)
                .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;
            return Ok(SearchPage {
                hits: Vec::new(),
                total,
            });
        }

        let (top_docs, total) = searcher
            .search(&combined, &(TopDocs::with_limit(fetch), Count))
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        let hits: Vec<SearchResult> = top_docs
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|(score, doc_address)| {
                let doc: TantivyDocument = searcher.doc(doc_address).ok()?;
                let task_id = doc.get_first(self.fields.task_id)?.as_str()?.to_string();
                Some(SearchResult { task_id, score })
            })
            .collect();

        Ok(SearchPage { hits, total })
    }

    fn create_document(&self, task: &Task) -> TantivyDocument {
        let mut doc = TantivyDocument::default();
        doc.add_text(self.fields.task_id, &task.id);
        doc.add_text(self.fields.title, &task.title);
        if let Some(description) = &task.description {
            doc.add_text(self.fields.description, description);
        }
        doc.add_text(self.fields.viewers, &task.created_by);
        for collaborator in &task.collaborators {
            doc.add_text(self.fields.viewers, collaborator);
        }
        doc
    }
}
