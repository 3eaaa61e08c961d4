//! Document snapshot definitions
//!
//! A snapshot is a point-in-time copy of a remote presentation. It is never
//! edited in place: every structural mutation on the remote side makes the
//! snapshot stale, and a fresh one has to be fetched.

use serde::{Deserialize, Serialize};

/// A fetched presentation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    /// Remote document identity
    pub document_id: String,
    /// Document title, if the service reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Slides in presentation order
    #[serde(default)]
    pub slides: Vec<Slide>,
}

/// One slide and its page elements
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Slide {
    /// Remote object identity of the slide
    pub object_id: String,
    /// Page elements in z-order
    #[serde(default)]
    pub elements: Vec<PageElement>,
}

/// A page element that deckfill cares about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PageElement {
    /// Text-bearing shape (text box, title, placeholder)
    Shape(Shape),
    /// Table
    Table(Table),
}

/// A text-bearing shape
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Shape {
    /// Remote object identity
    pub object_id: String,
    /// Shape type as reported by the service (`TEXT_BOX`, `TITLE`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape_type: Option<String>,
    /// Text runs in order
    #[serde(default)]
    pub runs: Vec<TextRun>,
}

/// A table
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    /// Remote object identity
    pub object_id: String,
    /// Rows, header first
    #[serde(default)]
    pub rows: Vec<TableRow>,
}

/// A table row
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableRow {
    /// Cells from left to right
    #[serde(default)]
    pub cells: Vec<TableCell>,
}

/// A table cell
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableCell {
    /// Text runs in order
    #[serde(default)]
    pub runs: Vec<TextRun>,
}

/// A contiguous run of text with uniform styling
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextRun {
    /// Run content
    pub content: String,
}

impl TextRun {
    /// Create a run from text
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

impl DocumentSnapshot {
    /// Create an empty snapshot for a document id
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            title: None,
            slides: Vec::new(),
        }
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Append a slide
    pub fn with_slide(mut self, slide: Slide) -> Self {
        self.slides.push(slide);
        self
    }

    /// Number of slides
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Find a slide by object id
    pub fn slide(&self, object_id: &str) -> Option<&Slide> {
        self.slides.iter().find(|s| s.object_id == object_id)
    }

    /// All tables with the index and id of the slide hosting them, in
    /// slide order and then element order
    pub fn tables(&self) -> impl Iterator<Item = (usize, &Slide, &Table)> {
        self.slides.iter().enumerate().flat_map(|(index, slide)| {
            slide.elements.iter().filter_map(move |element| match element {
                PageElement::Table(table) => Some((index, slide, table)),
                PageElement::Shape(_) => None,
            })
        })
    }

    /// Every text run in the document: shape runs and table cell runs
    pub fn text_runs(&self) -> impl Iterator<Item = &TextRun> {
        self.slides
            .iter()
            .flat_map(|slide| slide.elements.iter())
            .flat_map(PageElement::text_runs)
    }
}

impl Slide {
    /// Create an empty slide
    pub fn new(object_id: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            elements: Vec::new(),
        }
    }

    /// Append a page element
    pub fn with_element(mut self, element: PageElement) -> Self {
        self.elements.push(element);
        self
    }
}

impl PageElement {
    /// Remote object identity of the element
    pub fn object_id(&self) -> &str {
        match self {
            PageElement::Shape(shape) => &shape.object_id,
            PageElement::Table(table) => &table.object_id,
        }
    }

    /// Text runs held by the element, table cells in row-major order
    pub fn text_runs(&self) -> Box<dyn Iterator<Item = &TextRun> + '_> {
        match self {
            PageElement::Shape(shape) => Box::new(shape.runs.iter()),
            PageElement::Table(table) => Box::new(
                table
                    .rows
                    .iter()
                    .flat_map(|row| row.cells.iter())
                    .flat_map(|cell| cell.runs.iter()),
            ),
        }
    }
}

impl Shape {
    /// Create a text box holding a single run
    pub fn text_box(object_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            shape_type: Some("TEXT_BOX".to_string()),
            runs: vec![TextRun::new(text)],
        }
    }

    /// Concatenated text of all runs
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.content.as_str()).collect()
    }
}

impl Table {
    /// Build a table from rows of cell texts (one run per non-empty cell)
    pub fn from_rows<R, C>(object_id: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            object_id: object_id.into(),
            rows: rows
                .into_iter()
                .map(|cells| TableRow {
                    cells: cells.into_iter().map(TableCell::with_text).collect(),
                })
                .collect(),
        }
    }

    /// The header row, if the table has any rows
    pub fn header(&self) -> Option<&TableRow> {
        self.rows.first()
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns, taken from the widest row
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0)
    }

    /// Text of the cell at `(row, column)`
    pub fn cell_text(&self, row: usize, column: usize) -> Option<String> {
        self.rows
            .get(row)
            .and_then(|r| r.cells.get(column))
            .map(TableCell::text)
    }
}

impl TableCell {
    /// Create a cell holding `text` (no runs when empty)
    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let runs = if text.is_empty() {
            Vec::new()
        } else {
            vec![TextRun::new(text)]
        };
        Self { runs }
    }

    /// Concatenated text of all runs
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.content.as_str()).collect()
    }
}
