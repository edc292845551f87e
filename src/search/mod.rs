//! Tantivy-based search index module.
//!
//! Fuzzy, field-weighted matching over the document catalog. The index lives
//! in RAM and is rebuilt only when the catalog changes; each rebuild produces
//! a new generation that replaces the previous one whole, so readers never
//! observe a half-built index.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::Serialize;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, ConstScoreQuery, FuzzyTermQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Schema, Value, STORED, STRING, TEXT};
use tantivy::tokenizer::TokenStream;
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};

use crate::catalog::Catalog;
use crate::errors::AppError;
use crate::models::DocumentItem;

/// Field weights.
const WEIGHT_TITLE: f32 = 2.0;
const WEIGHT_BODY: f32 = 1.0;
const WEIGHT_CATEGORY: f32 = 0.5;

/// Best score one query token can reach: an exact and a fuzzy hit in every field.
const MAX_TOKEN_SCORE: f32 = 2.0 * (WEIGHT_TITLE + WEIGHT_BODY + WEIGHT_CATEGORY);

/// Largest edit distance tantivy's automata support.
const MAX_EDIT_DISTANCE: u8 = 2;

/// Queries shorter than this (in characters, after trimming) match nothing.
pub const MIN_QUERY_CHARS: usize = 2;

const WRITER_BUDGET: usize = 50_000_000;

/// A ranked search result. `distance` is in `[0, 1]`, lower is better.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub document: DocumentItem,
    pub distance: f32,
}

/// Search index schema fields.
#[derive(Clone, Copy)]
struct SearchFields {
    position: Field,
    title_key: Field,
    title: Field,
    body: Field,
    category: Field,
}

impl SearchFields {
    fn schema() -> (Schema, Self) {
        let mut schema_builder = Schema::builder();
        let position = schema_builder.add_u64_field("position", STORED);
        let title_key = schema_builder.add_text_field("title_key", STRING | STORED);
        let title = schema_builder.add_text_field("title", TEXT);
        let body = schema_builder.add_text_field("body", TEXT);
        let category = schema_builder.add_text_field("category", TEXT);
        let fields = Self {
            position,
            title_key,
            title,
            body,
            category,
        };
        (schema_builder.build(), fields)
    }

    fn weighted(&self) -> [(Field, f32); 3] {
        [
            (self.title, WEIGHT_TITLE),
            (self.body, WEIGHT_BODY),
            (self.category, WEIGHT_CATEGORY),
        ]
    }
}

/// One immutable build of the index, tied to the catalog it was built from.
struct Generation {
    number: u64,
    index: Index,
    reader: IndexReader,
    fields: SearchFields,
    catalog: Arc<Catalog>,
}

impl Generation {
    fn build(number: u64, catalog: Arc<Catalog>) -> Result<Self, AppError> {
        let (schema, fields) = SearchFields::schema();
        let index = Index::create_in_ram(schema);

        let mut writer: IndexWriter = index.writer_with_num_threads(1, WRITER_BUDGET)?;
        for (position, document) in catalog.documents().iter().enumerate() {
            writer.add_document(doc!(
                fields.position => position as u64,
                fields.title_key => title_key(&document.title),
                fields.title => document.title.clone(),
                fields.body => document.body.clone(),
                fields.category => format!(
                    "{} {}",
                    document.category.as_str(),
                    document.category.label()
                )
            ))?;
        }
        writer.commit()?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        Ok(Self {
            number,
            index,
            reader,
            fields,
            catalog,
        })
    }
}

/// Tantivy search index over the document catalog.
pub struct SearchIndex {
    threshold: f32,
    current: RwLock<Arc<Generation>>,
    // Held for a whole build + swap, so generations land in the order rebuilds started.
    build_lock: Mutex<()>,
}

impl SearchIndex {
    /// Create an empty index. `threshold` in `[0, 1]` sets how many typos a
    /// query token tolerates relative to its length; `0` means exact terms only.
    pub fn new(threshold: f32) -> Result<Self, AppError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(AppError::Validation(format!(
                "Search threshold {} is outside [0, 1]",
                threshold
            )));
        }
        let empty = Generation::build(0, Arc::new(Catalog::default()))?;
        Ok(Self {
            threshold,
            current: RwLock::new(Arc::new(empty)),
            build_lock: Mutex::new(()),
        })
    }

    /// Replace the index with one built from `catalog`. Returns the new generation number.
    ///
    /// Concurrent rebuilds run one at a time; the last one to start is the
    /// one left in place.
    pub fn rebuild(&self, catalog: Catalog) -> Result<u64, AppError> {
        let _building = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let built = Generation::build(0, Arc::new(catalog))?;
        let count = built.catalog.len();

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let number = current.number + 1;
        *current = Arc::new(Generation { number, ..built });

        tracing::info!("Search index rebuilt with {} documents (generation {})", count, number);
        Ok(number)
    }

    /// Current generation number. Starts at 0 with an empty catalog.
    pub fn generation(&self) -> u64 {
        self.snapshot().number
    }

    /// The catalog the current generation was built from.
    pub fn catalog(&self) -> Arc<Catalog> {
        self.snapshot().catalog.clone()
    }

    fn snapshot(&self) -> Arc<Generation> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Ranked matches for `query`, best first, at most `limit` of them.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, AppError> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS || limit == 0 {
            return Ok(Vec::new());
        }

        let generation = self.snapshot();
        if generation.catalog.is_empty() {
            return Ok(Vec::new());
        }
        let fields = generation.fields;

        let tokens = tokenize(&generation.index, fields.title, query)?;
        let wanted_key = title_key(query);

        let mut clauses: Vec<(Occur, Box<dyn Query>)> = vec![(
            Occur::Should,
            Box::new(TermQuery::new(
                Term::from_field_text(fields.title_key, &wanted_key),
                IndexRecordOption::Basic,
            )),
        )];
        for token in &tokens {
            let distance = self.edit_distance(token);
            for (field, weight) in fields.weighted() {
                let term = Term::from_field_text(field, token);
                clauses.push((
                    Occur::Should,
                    Box::new(ConstScoreQuery::new(
                        Box::new(TermQuery::new(term.clone(), IndexRecordOption::Basic)),
                        weight,
                    )),
                ));
                clauses.push((
                    Occur::Should,
                    Box::new(ConstScoreQuery::new(
                        Box::new(FuzzyTermQuery::new_prefix(term, distance, true)),
                        weight,
                    )),
                ));
            }
        }

        let searcher = generation.reader.searcher();
        let top_docs = searcher
            .search(
                &BooleanQuery::new(clauses),
                &TopDocs::with_limit(generation.catalog.len()),
            )
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        let max_score = tokens.len() as f32 * MAX_TOKEN_SCORE;
        let mut ranked: Vec<(f32, usize)> = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let stored: TantivyDocument = searcher.doc(address)?;
            let Some(position) = stored
                .get_first(fields.position)
                .and_then(|v| v.as_u64())
                .map(|p| p as usize)
            else {
                continue;
            };
            let exact = stored
                .get_first(fields.title_key)
                .and_then(|v| v.as_str())
                .is_some_and(|k| k == wanted_key);

            let distance = if exact {
                0.0
            } else if max_score > 0.0 {
                (1.0 - score / max_score).clamp(f32::EPSILON, 1.0)
            } else {
                1.0
            };
            ranked.push((distance, position));
        }

        ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        Ok(ranked
            .into_iter()
            .take(limit)
            .filter_map(|(distance, position)| {
                generation
                    .catalog
                    .documents()
                    .get(position)
                    .map(|document| SearchHit {
                        document: document.clone(),
                        distance,
                    })
            })
            .collect())
    }

    fn edit_distance(&self, token: &str) -> u8 {
        let allowed = (self.threshold * token.chars().count() as f32).floor();
        (allowed as u8).min(MAX_EDIT_DISTANCE)
    }
}

fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

fn tokenize(index: &Index, field: Field, text: &str) -> Result<Vec<String>, AppError> {
    let mut analyzer = index.tokenizer_for_field(field)?;
    let mut stream = analyzer.token_stream(text);
    let mut tokens = Vec::new();
    stream.process(&mut |token| {
        if !tokens.contains(&token.text) {
            tokens.push(token.text.clone());
        }
    });
    Ok(tokens)
}
