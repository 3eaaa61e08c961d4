//! In-memory document gateway
//!
//! Keeps presentations in process and applies operations with the same
//! observable contract as the remote service: batches are atomic, duplicated
//! objects get identities nobody can predict, and operations addressed to
//! missing objects reject the whole batch. Used for offline runs and tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use deckfill_model::{
    CellLocation, DocumentSnapshot, Operation, PageElement, Table, TableCell, TableRow, TextMatch,
    TextRun,
};
use regex::Regex;

use crate::chunker;
use crate::config::MAX_BATCH_BYTES;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::Gateway;

#[derive(Debug, Default)]
struct State {
    documents: BTreeMap<String, DocumentSnapshot>,
    folders: HashMap<String, String>,
    next_id: usize,
    mutate_calls: usize,
    applied: Vec<usize>,
    failures: HashMap<usize, GatewayError>,
}

/// Gateway over presentations held in memory
#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: Mutex<State>,
}

impl MemoryGateway {
    /// Create an empty gateway
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a gateway holding one document
    pub fn with_document(snapshot: DocumentSnapshot) -> Self {
        let gateway = Self::new();
        gateway.insert(snapshot);
        gateway
    }

    /// Store a document under its own id, replacing any previous version
    pub fn insert(&self, snapshot: DocumentSnapshot) {
        self.lock()
            .documents
            .insert(snapshot.document_id.clone(), snapshot);
    }

    /// Current state of a document
    pub fn document(&self, document_id: &str) -> Option<DocumentSnapshot> {
        self.lock().documents.get(document_id).cloned()
    }

    /// Folder a document was moved to
    pub fn folder_of(&self, document_id: &str) -> Option<String> {
        self.lock().folders.get(document_id).cloned()
    }

    /// Operation counts of every applied batch, in call order
    pub fn mutation_log(&self) -> Vec<usize> {
        self.lock().applied.clone()
    }

    /// Make the mutate call with 0-based position `call` fail with `error`
    pub fn fail_mutation(&self, call: usize, error: GatewayError) {
        self.lock().failures.insert(call, error);
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Gateway for MemoryGateway {
    fn name(&self) -> &str {
        "memory"
    }

    fn copy(&self, template_id: &str, title: &str) -> GatewayResult<String> {
        let mut state = self.lock();
        let template = state
            .documents
            .get(template_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("template {}", template_id)))?;

        state.next_id += 1;
        let document_id = format!("{}-copy-{}", template_id, state.next_id);
        let copy = DocumentSnapshot {
            document_id: document_id.clone(),
            title: Some(title.to_string()),
            slides: template.slides,
        };
        state.documents.insert(document_id.clone(), copy);
        Ok(document_id)
    }

    fn fetch(&self, document_id: &str) -> GatewayResult<DocumentSnapshot> {
        self.document(document_id)
            .ok_or_else(|| GatewayError::NotFound(format!("document {}", document_id)))
    }

    fn mutate(&self, document_id: &str, operations: &[Operation]) -> GatewayResult<()> {
        let size = chunker::payload_size(operations);
        if size > MAX_BATCH_BYTES {
            return Err(GatewayError::PayloadTooLarge {
                size,
                limit: MAX_BATCH_BYTES,
            });
        }

        let mut state = self.lock();
        let call = state.mutate_calls;
        state.mutate_calls += 1;
        if let Some(error) = state.failures.remove(&call) {
            return Err(error);
        }

        let mut working = state
            .documents
            .get(document_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("document {}", document_id)))?;
        let mut next_id = state.next_id;
        for operation in operations {
            apply(&mut working, operation, &mut next_id)?;
        }

        state.next_id = next_id;
        state.documents.insert(document_id.to_string(), working);
        state.applied.push(operations.len());
        Ok(())
    }

    fn move_to_folder(&self, document_id: &str, folder_id: &str) -> GatewayResult<()> {
        let mut state = self.lock();
        if !state.documents.contains_key(document_id) {
            return Err(GatewayError::NotFound(format!("document {}", document_id)));
        }
        state
            .folders
            .insert(document_id.to_string(), folder_id.to_string());
        Ok(())
    }
}

fn missing(object_id: &str) -> GatewayError {
    GatewayError::InvalidOperation(format!("object {} does not exist", object_id))
}

fn apply(doc: &mut DocumentSnapshot, operation: &Operation, next_id: &mut usize) -> GatewayResult<()> {
    match operation {
        Operation::DuplicateObject { object_id } => duplicate(doc, object_id, next_id),
        Operation::DeleteObject { object_id } => delete(doc, object_id),
        Operation::InsertTableRows {
            table_object_id,
            cell_location,
            insert_below,
            number,
        } => {
            let table = table_mut(doc, table_object_id).ok_or_else(|| missing(table_object_id))?;
            let anchor = cell_location.row_index as usize;
            if anchor >= table.rows.len() {
                return Err(GatewayError::InvalidOperation(format!(
                    "row {} is outside table {}",
                    anchor, table_object_id
                )));
            }
            let at = if *insert_below { anchor + 1 } else { anchor };
            let columns = table.column_count();
            for _ in 0..*number {
                let row = TableRow {
                    cells: vec![TableCell::default(); columns],
                };
                table.rows.insert(at, row);
            }
            Ok(())
        }
        Operation::InsertText {
            object_id,
            cell_location,
            text,
            insertion_index,
        } => {
            let runs = text_target(doc, object_id, *cell_location)?;
            insert_text(runs, *insertion_index as usize, text);
            Ok(())
        }
        Operation::ReplaceAllText {
            contains_text,
            replace_text,
        } => replace_all(doc, contains_text, replace_text),
    }
}

fn duplicate(doc: &mut DocumentSnapshot, object_id: &str, next_id: &mut usize) -> GatewayResult<()> {
    *next_id += 1;
    let suffix = format!("_dup{}", next_id);

    if let Some(index) = doc.slides.iter().position(|s| s.object_id == object_id) {
        let mut copy = doc.slides[index].clone();
        copy.object_id.push_str(&suffix);
        for element in &mut copy.elements {
            rename(element, &suffix);
        }
        doc.slides.insert(index + 1, copy);
        return Ok(());
    }

    for slide in &mut doc.slides {
        if let Some(index) = slide.elements.iter().position(|e| e.object_id() == object_id) {
            let mut copy = slide.elements[index].clone();
            rename(&mut copy, &suffix);
            slide.elements.insert(index + 1, copy);
            return Ok(());
        }
    }
    Err(missing(object_id))
}

fn rename(element: &mut PageElement, suffix: &str) {
    match element {
        PageElement::Shape(shape) => shape.object_id.push_str(suffix),
        PageElement::Table(table) => table.object_id.push_str(suffix),
    }
}

fn delete(doc: &mut DocumentSnapshot, object_id: &str) -> GatewayResult<()> {
    if let Some(index) = doc.slides.iter().position(|s| s.object_id == object_id) {
        doc.slides.remove(index);
        return Ok(());
    }
    for slide in &mut doc.slides {
        if let Some(index) = slide.elements.iter().position(|e| e.object_id() == object_id) {
            slide.elements.remove(index);
            return Ok(());
        }
    }
    Err(missing(object_id))
}

fn table_mut<'a>(doc: &'a mut DocumentSnapshot, table_id: &str) -> Option<&'a mut Table> {
    doc.slides
        .iter_mut()
        .flat_map(|slide| slide.elements.iter_mut())
        .find_map(|element| match element {
            PageElement::Table(table) if table.object_id == table_id => Some(table),
            _ => None,
        })
}

fn text_target<'a>(
    doc: &'a mut DocumentSnapshot,
    object_id: &str,
    location: Option<CellLocation>,
) -> GatewayResult<&'a mut Vec<TextRun>> {
    let element = doc
        .slides
        .iter_mut()
        .flat_map(|slide| slide.elements.iter_mut())
        .find(|element| element.object_id() == object_id)
        .ok_or_else(|| missing(object_id))?;

    match (element, location) {
        (PageElement::Shape(shape), None) => Ok(&mut shape.runs),
        (PageElement::Table(table), Some(at)) => table
            .rows
            .get_mut(at.row_index as usize)
            .and_then(|row| row.cells.get_mut(at.column_index as usize))
            .map(|cell| &mut cell.runs)
            .ok_or_else(|| {
                GatewayError::InvalidOperation(format!(
                    "cell ({}, {}) is outside table {}",
                    at.row_index, at.column_index, object_id
                ))
            }),
        (PageElement::Shape(_), Some(_)) => Err(GatewayError::InvalidOperation(format!(
            "{} is a shape, not a table",
            object_id
        ))),
        (PageElement::Table(_), None) => Err(GatewayError::InvalidOperation(format!(
            "text insertion into table {} needs a cell location",
            object_id
        ))),
    }
}

/// Insert `text` at character position `index`, merging runs into one
fn insert_text(runs: &mut Vec<TextRun>, index: usize, text: &str) {
    let current: String = runs.iter().map(|r| r.content.as_str()).collect();
    let byte = current
        .char_indices()
        .nth(index)
        .map(|(b, _)| b)
        .unwrap_or(current.len());
    let mut merged = String::with_capacity(current.len() + text.len());
    merged.push_str(&current[..byte]);
    merged.push_str(text);
    merged.push_str(&current[byte..]);
    *runs = vec![TextRun::new(merged)];
}

fn replace_all(doc: &mut DocumentSnapshot, needle: &TextMatch, replacement: &str) -> GatewayResult<()> {
    if needle.text.is_empty() {
        return Err(GatewayError::InvalidOperation(
            "replaceAllText needs a non-empty search text".to_string(),
        ));
    }
    let insensitive = if needle.match_case {
        None
    } else {
        Some(
            Regex::new(&format!("(?i){}", regex::escape(&needle.text)))
                .map_err(|e| GatewayError::InvalidOperation(e.to_string()))?,
        )
    };

    for slide in &mut doc.slides {
        for element in &mut slide.elements {
            let runs: Vec<&mut TextRun> = match element {
                PageElement::Shape(shape) => shape.runs.iter_mut().collect(),
                PageElement::Table(table) => table
                    .rows
                    .iter_mut()
                    .flat_map(|row| row.cells.iter_mut())
                    .flat_map(|cell| cell.runs.iter_mut())
                    .collect(),
            };
            for run in runs {
                run.content = match &insensitive {
                    None => run.content.replace(&needle.text, replacement),
                    Some(re) => re
                        .replace_all(&run.content, regex::NoExpand(replacement))
                        .into_owned(),
                };
            }
        }
    }
    Ok(())
}
