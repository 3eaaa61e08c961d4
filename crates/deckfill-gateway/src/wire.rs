//! Presentation JSON decoding
//!
//! Converts the Slides API `presentations.get` resource into a
//! [`DocumentSnapshot`]. Only shapes and tables are kept; images, lines,
//! videos and groups carry no text the engine could use.

use deckfill_core::{GatewayError, GatewayResult};
use deckfill_model::{
    DocumentSnapshot, PageElement, Shape, Slide, Table, TableCell, TableRow, TextRun,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    pub presentation_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slides: Vec<Page>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub object_id: String,
    #[serde(default)]
    pub page_elements: Vec<WireElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireElement {
    pub object_id: String,
    #[serde(default)]
    pub shape: Option<WireShape>,
    #[serde(default)]
    pub table: Option<WireTable>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireShape {
    #[serde(default)]
    pub shape_type: Option<String>,
    #[serde(default)]
    pub text: Option<TextContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    #[serde(default)]
    pub text_elements: Vec<TextElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    /// Absent for paragraph markers and auto text
    #[serde(default)]
    pub text_run: Option<WireTextRun>,
}

#[derive(Debug, Deserialize)]
pub struct WireTextRun {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTable {
    #[serde(default)]
    pub table_rows: Vec<WireRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRow {
    #[serde(default)]
    pub table_cells: Vec<WireCell>,
}

#[derive(Debug, Deserialize)]
pub struct WireCell {
    #[serde(default)]
    pub text: Option<TextContent>,
}

/// Decode a presentation resource from its JSON body
pub fn decode(body: &[u8]) -> GatewayResult<DocumentSnapshot> {
    let presentation: Presentation = serde_json::from_slice(body)
        .map_err(|e| GatewayError::Malformed(format!("presentation: {}", e)))?;
    Ok(presentation.into())
}

impl From<Presentation> for DocumentSnapshot {
    fn from(p: Presentation) -> Self {
        DocumentSnapshot {
            document_id: p.presentation_id,
            title: p.title,
            slides: p.slides.into_iter().map(Slide::from).collect(),
        }
    }
}

impl From<Page> for Slide {
    fn from(page: Page) -> Self {
        Slide {
            object_id: page.object_id,
            elements: page
                .page_elements
                .into_iter()
                .filter_map(WireElement::into_element)
                .collect(),
        }
    }
}

impl WireElement {
    fn into_element(self) -> Option<PageElement> {
        if let Some(table) = self.table {
            return Some(PageElement::Table(Table {
                object_id: self.object_id,
                rows: table
                    .table_rows
                    .into_iter()
                    .map(|row| TableRow {
                        cells: row
                            .table_cells
                            .into_iter()
                            .map(|cell| TableCell {
                                runs: runs(cell.text),
                            })
                            .collect(),
                    })
                    .collect(),
            }));
        }
        self.shape.map(|shape| {
            PageElement::Shape(Shape {
                object_id: self.object_id,
                shape_type: shape.shape_type,
                runs: runs(shape.text),
            })
        })
    }
}

fn runs(text: Option<TextContent>) -> Vec<TextRun> {
    text.unwrap_or_default()
        .text_elements
        .into_iter()
        .filter_map(|e| e.text_run)
        .map(|r| TextRun::new(r.content))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "presentationId": "abc123",
        "title": "Quarterly Review",
        "slides": [
            {
                "objectId": "p1",
                "pageElements": [
                    {
                        "objectId": "title_1",
                        "shape": {
                            "shapeType": "TEXT_BOX",
                            "text": {
                                "textElements": [
                                    {"endIndex": 1, "paragraphMarker": {}},
                                    {"textRun": {"content": "Hello {{company_name}}\n"}}
                                ]
                            }
                        }
                    },
                    {"objectId": "img_1", "image": {"contentUrl": "https://example.com/x.png"}},
                    {
                        "objectId": "tbl_1",
                        "table": {
                            "rows": 2,
                            "columns": 2,
                            "tableRows": [
                                {"tableCells": [
                                    {"text": {"textElements": [{"textRun": {"content": "{{ARRAY:employees}}Name\n"}}]}},
                                    {"text": {"textElements": [{"textRun": {"content": "Role\n"}}]}}
                                ]},
                                {"tableCells": [{}, {}]}
                            ]
                        }
                    }
                ]
            },
            {"objectId": "p2"}
        ]
    }"#;

    #[test]
    fn test_decode_presentation() {
        let doc = decode(SAMPLE.as_bytes()).unwrap();
        assert_eq!(doc.document_id, "abc123");
        assert_eq!(doc.title.as_deref(), Some("Quarterly Review"));
        assert_eq!(doc.slide_count(), 2);

        let first = &doc.slides[0];
        assert_eq!(first.elements.len(), 2);
        match &first.elements[0] {
            PageElement::Shape(shape) => {
                assert_eq!(shape.shape_type.as_deref(), Some("TEXT_BOX"));
                assert_eq!(shape.text(), "Hello {{company_name}}\n");
            }
            other => panic!("Expected shape, got {:?}", other),
        }

        let (_, _, table) = doc.tables().next().unwrap();
        assert_eq!(table.object_id, "tbl_1");
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell_text(0, 1).as_deref(), Some("Role\n"));
        assert_eq!(table.cell_text(1, 0).as_deref(), Some(""));
        assert!(doc.slides[1].elements.is_empty());
    }

    #[test]
    fn test_malformed_body() {
        let err = decode(b"{\"slides\": 3}").unwrap_err();
        assert!(matches!(err, GatewayError::Malformed(_)));
    }
}
