//! Row and cell request building
//!
//! Instance `k` of a slide group hosts items `[k*ips, (k+1)*ips)`. Every
//! item gets one row inserted below the header and one text insertion per
//! header column. Rows that would stay empty are never created.

use deckfill_model::{CellLocation, Operation};
use serde_json::{Map, Value};

use crate::executor::SlideGroup;
use crate::planner::PopulationPlan;

/// Row-insertion and cell-text operations for one group
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRequests {
    pub rows: Vec<Operation>,
    pub cells: Vec<Operation>,
}

impl TableRequests {
    /// Append the requests of another group
    pub fn extend(&mut self, other: TableRequests) {
        self.rows.extend(other.rows);
        self.cells.extend(other.cells);
    }
}

/// Build the requests filling `group` with the items of `plan`
pub fn build(group: &SlideGroup, plan: &PopulationPlan<'_>) -> TableRequests {
    let mut requests = TableRequests::default();

    for (instance, table_id) in group.table_ids.iter().enumerate() {
        let items = plan.slice_for(instance);
        for _ in items {
            requests.rows.push(Operation::insert_row_below_header(table_id));
        }
        for (position, item) in items.iter().enumerate() {
            let row = position as u32 + 1;
            for (column, label) in group.columns.iter().enumerate() {
                let text = cell_value(item, label, column);
                requests.cells.push(Operation::set_cell_text(
                    table_id,
                    CellLocation::new(row, column as u32),
                    text,
                ));
            }
        }
    }

    tracing::debug!(
        array_key = %group.array_key,
        rows = requests.rows.len(),
        cells = requests.cells.len(),
        "built table requests"
    );
    requests
}

/// Text of column `column` (labelled `label`) for one item
///
/// Objects are looked up by label; anything else fills the first column.
pub fn cell_value(item: &Value, label: &str, column: usize) -> String {
    match item {
        Value::Object(fields) => lookup(fields, label).map(render).unwrap_or_default(),
        other if column == 0 => render(other),
        _ => String::new(),
    }
}

/// Field named `label`, or failing that the one whose trimmed name matches
fn lookup<'a>(fields: &'a Map<String, Value>, label: &str) -> Option<&'a Value> {
    fields.get(label).or_else(|| {
        let wanted = label.trim();
        fields
            .iter()
            .find(|(name, _)| name.trim() == wanted)
            .map(|(_, value)| value)
    })
}

/// Cell text of a data value
pub fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner;
    use crate::resolver::Binding;
    use deckfill_model::Table;
    use serde_json::json;

    fn group(tables: &[&str], columns: &[&str]) -> SlideGroup {
        SlideGroup {
            array_key: "employees".to_string(),
            table_ids: tables.iter().map(|t| t.to_string()).collect(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn plan(items: &Value, ips: usize) -> PopulationPlan<'_> {
        let binding = Binding {
            slide_id: "s1".to_string(),
            slide_index: 0,
            table_id: "t1".to_string(),
            array_key: "employees".to_string(),
            table: Table::default(),
        };
        planner::plan(&binding, items, ips).unwrap()
    }

    fn employees(n: usize) -> Value {
        Value::Array(
            (0..n)
                .map(|i| json!({"name": format!("E{}", i), "age": 30 + i}))
                .collect(),
        )
    }

    #[test]
    fn test_counts_follow_slices() {
        let items = employees(12);
        let p = plan(&items, 5);
        let req = build(&group(&["a", "b", "c"], &["name", "age"]), &p);

        assert_eq!(req.rows.len(), 12);
        assert_eq!(req.cells.len(), 24);
        let on_c = req
            .rows
            .iter()
            .filter(|op| op.target() == Some("c"))
            .count();
        assert_eq!(on_c, 2);
    }

    #[test]
    fn test_cell_locations_and_values() {
        let items = employees(6);
        let p = plan(&items, 5);
        let req = build(&group(&["a", "b"], &["name", "age"]), &p);

        assert_eq!(
            req.cells[0],
            Operation::set_cell_text("a", CellLocation::new(1, 0), "E0")
        );
        assert_eq!(
            req.cells[1],
            Operation::set_cell_text("a", CellLocation::new(1, 1), "30")
        );
        assert_eq!(
            req.cells[10],
            Operation::set_cell_text("b", CellLocation::new(1, 0), "E5")
        );
    }

    #[test]
    fn test_no_ops_outside_group() {
        let items = employees(7);
        let p = plan(&items, 5);
        let req = build(&group(&["a", "b"], &["name"]), &p);
        assert!(req
            .rows
            .iter()
            .chain(req.cells.iter())
            .all(|op| matches!(op.target(), Some("a") | Some("b"))));
    }

    #[test]
    fn test_extra_tables_receive_nothing() {
        let items = employees(3);
        let p = plan(&items, 5);
        let req = build(&group(&["a", "spare"], &["name"]), &p);
        assert!(req.rows.iter().all(|op| op.target() == Some("a")));
        assert_eq!(req.rows.len(), 3);
    }

    #[test]
    fn test_rendering() {
        assert_eq!(render(&json!("x")), "x");
        assert_eq!(render(&json!(4.5)), "4.5");
        assert_eq!(render(&json!(true)), "true");
        assert_eq!(render(&json!(null)), "");
        assert_eq!(render(&json!([1, "a"])), r#"[1,"a"]"#);
    }

    #[test]
    fn test_header_lookup() {
        let item = json!({"name": "Ada", " role ": "CTO"});
        assert_eq!(cell_value(&item, "name", 0), "Ada");
        assert_eq!(cell_value(&item, "role", 1), "CTO");
        assert_eq!(cell_value(&item, "missing", 2), "");
    }

    #[test]
    fn test_non_object_item_fills_first_column() {
        assert_eq!(cell_value(&json!("plain"), "name", 0), "plain");
        assert_eq!(cell_value(&json!("plain"), "role", 1), "");
    }
}
