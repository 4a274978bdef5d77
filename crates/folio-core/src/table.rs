//! Table block content
//!
//! A table is a list of typed columns and a list of rows. Each row maps
//! column ids to cells. Every row carries a cell for every column: adding a
//! column adds an empty cell to each row and deleting a column removes its
//! cell from each row.
//!
//! Rows form a shallow outline (levels 0 to 3) through `level` and
//! `parent_id`, and a cell may hold a single-function formula such as
//! `=SUM(col-1)`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::block::TextAlign;
use crate::models::{new_id, ValidationError};

/// Deepest outline level a row can have
pub const MAX_ROW_LEVEL: u8 = 3;

/// Width given to newly added columns
pub const DEFAULT_COLUMN_WIDTH: u32 = 150;

/// Value type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    Text,
    Number,
    Currency,
    Date,
    Percentage,
}

impl std::str::FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(ColumnType::Text),
            "number" => Ok(ColumnType::Number),
            "currency" => Ok(ColumnType::Currency),
            "date" => Ok(ColumnType::Date),
            "percentage" => Ok(ColumnType::Percentage),
            other => Err(format!(
                "unknown column type '{}' (expected text, number, currency, date or percentage)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableColumn {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub width: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// A cell value: text, number, boolean or empty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Text(String::new())
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CellStyles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
}

impl CellStyles {
    /// Overlay the fields set in `other`
    pub fn merge(&mut self, other: CellStyles) {
        if other.font_weight.is_some() {
            self.font_weight = other.font_weight;
        }
        if other.color.is_some() {
            self.color = other.color;
        }
        if other.background_color.is_some() {
            self.background_color = other.background_color;
        }
        if other.text_align.is_some() {
            self.text_align = other.text_align;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableCell {
    pub value: CellValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<CellStyles>,
}

impl TableCell {
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            formula: None,
            styles: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RowStyles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TableRow {
    pub id: String,
    /// Cells keyed by column id
    pub cells: BTreeMap<String, TableCell>,
    /// Outline level, 0 to [`MAX_ROW_LEVEL`]
    pub level: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<RowStyles>,
}

impl TableRow {
    /// A top-level row with an empty cell for each column
    fn for_columns(columns: &[TableColumn]) -> Self {
        Self {
            id: new_id("row"),
            cells: columns
                .iter()
                .map(|col| (col.id.clone(), TableCell::default()))
                .collect(),
            level: 0,
            parent_id: None,
            collapsed: None,
            styles: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableContent {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<TableRow>,
}

impl TableContent {
    /// A one-column, one-row table for newly inserted table blocks
    pub fn starter() -> Self {
        let mut table = Self::default();
        table.add_column(None, ColumnType::Text);
        table.add_row();
        table
    }

    pub fn column(&self, id: &str) -> Option<&TableColumn> {
        self.columns.iter().find(|col| col.id == id)
    }

    /// Append a column and give every existing row an empty cell for it
    ///
    /// Returns the new column id. Unnamed columns are called `Column N`.
    pub fn add_column(&mut self, name: Option<String>, column_type: ColumnType) -> String {
        let column = TableColumn {
            id: new_id("col"),
            name: name.unwrap_or_else(|| format!("Column {}", self.columns.len() + 1)),
            column_type,
            width: DEFAULT_COLUMN_WIDTH,
            format: None,
        };
        for row in &mut self.rows {
            row.cells.insert(column.id.clone(), TableCell::default());
        }
        let id = column.id.clone();
        self.columns.push(column);
        id
    }

    /// Remove a column and its cell from every row
    pub fn delete_column(&mut self, column_id: &str) -> Result<(), ValidationError> {
        let index = self
            .columns
            .iter()
            .position(|col| col.id == column_id)
            .ok_or_else(|| ValidationError::UnknownColumn(column_id.to_string()))?;
        self.columns.remove(index);
        for row in &mut self.rows {
            row.cells.remove(column_id);
        }
        Ok(())
    }

    /// Append a top-level row; returns its id
    pub fn add_row(&mut self) -> String {
        let row = TableRow::for_columns(&self.columns);
        let id = row.id.clone();
        self.rows.push(row);
        id
    }

    pub fn delete_row(&mut self, index: usize) -> Result<TableRow, ValidationError> {
        self.check_row(index)?;
        let removed = self.rows.remove(index);
        for row in &mut self.rows {
            if row.parent_id.as_deref() == Some(removed.id.as_str()) {
                row.parent_id = None;
            }
        }
        Ok(removed)
    }

    /// Set a cell's value, keeping its formula and styles
    pub fn update_cell_value(
        &mut self,
        row_index: usize,
        column_id: &str,
        value: CellValue,
    ) -> Result<(), ValidationError> {
        self.cell_mut(row_index, column_id)?.value = value;
        Ok(())
    }

    /// Set or clear a cell's formula
    pub fn update_cell_formula(
        &mut self,
        row_index: usize,
        column_id: &str,
        formula: Option<String>,
    ) -> Result<(), ValidationError> {
        self.cell_mut(row_index, column_id)?.formula = formula;
        Ok(())
    }

    /// Merge styles into a cell
    pub fn update_cell_styles(
        &mut self,
        row_index: usize,
        column_id: &str,
        styles: CellStyles,
    ) -> Result<(), ValidationError> {
        self.cell_mut(row_index, column_id)?
            .styles
            .get_or_insert_with(CellStyles::default)
            .merge(styles);
        Ok(())
    }

    /// Move a row one level deeper under the closest preceding row
    ///
    /// A row can be at most one level deeper than the row above it.
    pub fn indent_row(&mut self, index: usize) -> Result<(), ValidationError> {
        self.check_row(index)?;
        let max_level = match index {
            0 => 0,
            _ => (self.rows[index - 1].level + 1).min(MAX_ROW_LEVEL),
        };
        let level = (self.rows[index].level + 1).min(max_level);
        self.set_row_level(index, level);
        Ok(())
    }

    /// Move a row one level up
    pub fn outdent_row(&mut self, index: usize) -> Result<(), ValidationError> {
        self.check_row(index)?;
        let level = self.rows[index].level.saturating_sub(1);
        self.set_row_level(index, level);
        Ok(())
    }

    pub fn toggle_collapsed(&mut self, index: usize) -> Result<bool, ValidationError> {
        self.check_row(index)?;
        let row = &mut self.rows[index];
        let collapsed = !row.collapsed.unwrap_or(false);
        row.collapsed = Some(collapsed);
        Ok(collapsed)
    }

    /// The value to show for a cell: the formula result if it has one
    pub fn display_value(&self, row_index: usize, column_id: &str) -> Option<CellValue> {
        let cell = self.rows.get(row_index)?.cells.get(column_id)?;
        Some(match cell.formula {
            Some(ref formula) => self.evaluate_formula(formula),
            None => cell.value.clone(),
        })
    }

    /// Evaluate `=SUM(col)`, `=AVERAGE(col)` or `=COUNT(col)` over every row
    ///
    /// Non-numeric cells count as 0 and are included in the count. Anything
    /// that is not one of these formulas evaluates to its own text.
    pub fn evaluate_formula(&self, formula: &str) -> CellValue {
        let Some((function, column_id)) = parse_formula(formula) else {
            return CellValue::Text(formula.to_string());
        };

        let values: Vec<f64> = self
            .rows
            .iter()
            .map(|row| {
                row.cells
                    .get(column_id)
                    .and_then(|cell| cell.value.as_number())
                    .unwrap_or(0.0)
            })
            .collect();
        let sum: f64 = values.iter().sum();

        CellValue::Number(match function {
            Aggregate::Sum => sum,
            Aggregate::Average if values.is_empty() => 0.0,
            Aggregate::Average => sum / values.len() as f64,
            Aggregate::Count => values.len() as f64,
        })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = std::collections::HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.id.as_str()) {
                return Err(ValidationError::DuplicateId(column.id.clone()));
            }
        }
        for row in &self.rows {
            if row.level > MAX_ROW_LEVEL {
                return Err(ValidationError::RowLevel(row.level));
            }
            if let Some(key) = row.cells.keys().find(|key| !seen.contains(key.as_str())) {
                return Err(ValidationError::UnknownColumn(key.clone()));
            }
            let missing = self
                .columns
                .iter()
                .find(|col| !row.cells.contains_key(&col.id));
            if let Some(column) = missing {
                return Err(ValidationError::MissingCell {
                    row: row.id.clone(),
                    column: column.id.clone(),
                });
            }
        }
        Ok(())
    }

    fn check_row(&self, index: usize) -> Result<(), ValidationError> {
        if index >= self.rows.len() {
            return Err(ValidationError::RowOutOfBounds {
                index,
                len: self.rows.len(),
            });
        }
        Ok(())
    }

    fn cell_mut(
        &mut self,
        row_index: usize,
        column_id: &str,
    ) -> Result<&mut TableCell, ValidationError> {
        self.check_row(row_index)?;
        if self.column(column_id).is_none() {
            return Err(ValidationError::UnknownColumn(column_id.to_string()));
        }
        Ok(self.rows[row_index]
            .cells
            .entry(column_id.to_string())
            .or_default())
    }

    fn set_row_level(&mut self, index: usize, level: u8) {
        let parent_id = match level {
            0 => None,
            _ => self.rows[..index]
                .iter()
                .rev()
                .find(|row| row.level == level - 1)
                .map(|row| row.id.clone()),
        };
        let row = &mut self.rows[index];
        row.level = level;
        row.parent_id = parent_id;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Aggregate {
    Sum,
    Average,
    Count,
}

/// Split `=FUNC(column-id)` into its function and column id
fn parse_formula(formula: &str) -> Option<(Aggregate, &str)> {
    let body = formula.strip_prefix('=')?;
    let (name, rest) = body.split_once('(')?;
    let column_id = rest.strip_suffix(')')?;

    let function = match name.to_ascii_uppercase().as_str() {
        "SUM" => Aggregate::Sum,
        "AVERAGE" => Aggregate::Average,
        "COUNT" => Aggregate::Count,
        _ => return None,
    };
    let valid_column = !column_id.is_empty()
        && column_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    valid_column.then_some((function, column_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers_table(values: &[CellValue]) -> (TableContent, String) {
        let mut table = TableContent::default();
        let col = table.add_column(Some("Amount".to_string()), ColumnType::Number);
        for (i, value) in values.iter().enumerate() {
            table.add_row();
            table.update_cell_value(i, &col, value.clone()).unwrap();
        }
        (table, col)
    }

    #[test]
    fn test_add_column_adds_cell_to_every_row() {
        let mut table = TableContent::default();
        table.add_column(None, ColumnType::Text);
        table.add_row();
        table.add_row();

        let col = table.add_column(None, ColumnType::Number);

        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.columns[1].name, "Column 2");
        assert_eq!(table.columns[1].width, DEFAULT_COLUMN_WIDTH);
        for row in &table.rows {
            assert_eq!(row.cells.len(), 2);
            assert_eq!(row.cells[&col].value, CellValue::Text(String::new()));
        }
    }

    #[test]
    fn test_delete_column_removes_key_from_every_row() {
        let mut table = TableContent::starter();
        let extra = table.add_column(Some("Extra".to_string()), ColumnType::Text);
        table.add_row();

        table.delete_column(&extra).unwrap();

        assert_eq!(table.columns.len(), 1);
        assert!(table.rows.iter().all(|row| !row.cells.contains_key(&extra)));
        assert!(table.rows.iter().all(|row| row.cells.len() == 1));
    }

    #[test]
    fn test_delete_unknown_column() {
        let mut table = TableContent::starter();
        assert_eq!(
            table.delete_column("col-missing"),
            Err(ValidationError::UnknownColumn("col-missing".to_string()))
        );
    }

    #[test]
    fn test_add_row_has_cell_per_column() {
        let mut table = TableContent::default();
        let a = table.add_column(None, ColumnType::Text);
        let b = table.add_column(None, ColumnType::Number);

        table.add_row();

        let row = &table.rows[0];
        assert_eq!(row.level, 0);
        assert!(row.cells.contains_key(&a));
        assert!(row.cells.contains_key(&b));
    }

    #[test]
    fn test_update_cell_keeps_formula() {
        let mut table = TableContent::starter();
        let col = table.columns[0].id.clone();
        table
            .update_cell_formula(0, &col, Some("=COUNT(x)".to_string()))
            .unwrap();
        table
            .update_cell_value(0, &col, CellValue::Number(4.0))
            .unwrap();

        let cell = &table.rows[0].cells[&col];
        assert_eq!(cell.value, CellValue::Number(4.0));
        assert_eq!(cell.formula.as_deref(), Some("=COUNT(x)"));
    }

    #[test]
    fn test_update_cell_bounds() {
        let mut table = TableContent::starter();
        let col = table.columns[0].id.clone();
        assert_eq!(
            table.update_cell_value(5, &col, CellValue::Null),
            Err(ValidationError::RowOutOfBounds { index: 5, len: 1 })
        );
        assert!(matches!(
            table.update_cell_value(0, "nope", CellValue::Null),
            Err(ValidationError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_update_cell_styles_merges() {
        let mut table = TableContent::starter();
        let col = table.columns[0].id.clone();
        table
            .update_cell_styles(
                0,
                &col,
                CellStyles {
                    color: Some("#f00".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        table
            .update_cell_styles(
                0,
                &col,
                CellStyles {
                    font_weight: Some(700),
                    ..Default::default()
                },
            )
            .unwrap();

        let styles = table.rows[0].cells[&col].styles.clone().unwrap();
        assert_eq!(styles.color.as_deref(), Some("#f00"));
        assert_eq!(styles.font_weight, Some(700));
    }

    #[test]
    fn test_formulas() {
        let (table, col) = numbers_table(&[
            CellValue::Number(10.0),
            CellValue::Number(20.0),
            CellValue::Text("n/a".to_string()),
        ]);

        assert_eq!(
            table.evaluate_formula(&format!("=SUM({})", col)),
            CellValue::Number(30.0)
        );
        assert_eq!(
            table.evaluate_formula(&format!("=average({})", col)),
            CellValue::Number(10.0)
        );
        // Non-numeric cells are counted
        assert_eq!(
            table.evaluate_formula(&format!("=Count({})", col)),
            CellValue::Number(3.0)
        );
    }

    #[test]
    fn test_unsupported_formula_is_returned_verbatim() {
        let (table, _) = numbers_table(&[CellValue::Number(1.0)]);
        for formula in ["=MAX(col)", "=SUM(a,b)", "=SUM()", "SUM(col)", "=SUM(col"] {
            assert_eq!(
                table.evaluate_formula(formula),
                CellValue::Text(formula.to_string())
            );
        }
    }

    #[test]
    fn test_average_of_empty_table() {
        let table = TableContent::default();
        assert_eq!(
            table.evaluate_formula("=AVERAGE(col-1)"),
            CellValue::Number(0.0)
        );
    }

    #[test]
    fn test_display_value_uses_formula() {
        let (mut table, col) = numbers_table(&[CellValue::Number(2.0), CellValue::Number(3.0)]);
        table.add_row();
        table
            .update_cell_formula(2, &col, Some(format!("=SUM({})", col)))
            .unwrap();

        assert_eq!(table.display_value(0, &col), Some(CellValue::Number(2.0)));
        assert_eq!(table.display_value(2, &col), Some(CellValue::Number(5.0)));
        assert_eq!(table.display_value(9, &col), None);
    }

    #[test]
    fn test_indent_and_outdent() {
        let mut table = TableContent::starter();
        table.add_row();
        table.add_row();
        let first = table.rows[0].id.clone();
        let second = table.rows[1].id.clone();

        // The first row has nothing to nest under
        table.indent_row(0).unwrap();
        assert_eq!(table.rows[0].level, 0);

        table.indent_row(1).unwrap();
        assert_eq!(table.rows[1].level, 1);
        assert_eq!(table.rows[1].parent_id.as_deref(), Some(first.as_str()));

        // Cannot skip a level
        table.indent_row(2).unwrap();
        table.indent_row(2).unwrap();
        table.indent_row(2).unwrap();
        assert_eq!(table.rows[2].level, 2);
        assert_eq!(table.rows[2].parent_id.as_deref(), Some(second.as_str()));

        table.outdent_row(2).unwrap();
        table.outdent_row(2).unwrap();
        table.outdent_row(2).unwrap();
        assert_eq!(table.rows[2].level, 0);
        assert!(table.rows[2].parent_id.is_none());
    }

    #[test]
    fn test_delete_row_orphans_children() {
        let mut table = TableContent::starter();
        table.add_row();
        table.indent_row(1).unwrap();

        table.delete_row(0).unwrap();

        assert_eq!(table.rows.len(), 1);
        assert!(table.rows[0].parent_id.is_none());
        assert!(table.delete_row(3).is_err());
    }

    #[test]
    fn test_toggle_collapsed() {
        let mut table = TableContent::starter();
        assert!(table.toggle_collapsed(0).unwrap());
        assert!(!table.toggle_collapsed(0).unwrap());
    }

    #[test]
    fn test_cell_value_json_shapes() {
        let cells: Vec<CellValue> =
            serde_json::from_str(r#"[null, true, 1.5, "text", ""]"#).unwrap();
        assert_eq!(
            cells,
            vec![
                CellValue::Null,
                CellValue::Bool(true),
                CellValue::Number(1.5),
                CellValue::Text("text".to_string()),
                CellValue::Text(String::new()),
            ]
        );
        assert_eq!(serde_json::to_string(&CellValue::Null).unwrap(), "null");
    }

    #[test]
    fn test_validate_requires_one_cell_per_column() {
        let mut table = TableContent::starter();
        let col = table.columns[0].id.clone();
        let row = table.rows[0].id.clone();

        let cell = table.rows[0].cells.remove(&col).unwrap();
        assert_eq!(
            table.validate(),
            Err(ValidationError::MissingCell {
                row,
                column: col.clone(),
            })
        );

        table.rows[0].cells.insert(col, cell);
        table.rows[0]
            .cells
            .insert("col-ghost".to_string(), TableCell::default());
        assert_eq!(
            table.validate(),
            Err(ValidationError::UnknownColumn("col-ghost".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_deep_rows() {
        let mut table = TableContent::starter();
        table.rows[0].level = 4;
        assert_eq!(table.validate(), Err(ValidationError::RowLevel(4)));
    }
}
