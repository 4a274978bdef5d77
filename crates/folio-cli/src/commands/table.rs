//! Table command handlers
//!
//! Every command opens the document, applies one table operation to the
//! given table block and saves the document.

use anyhow::{anyhow, Context, Result};

use folio_core::{
    BlockContent, BlockType, CellValue, ColumnType, Document, DocumentStore, KeyValueStore,
    TableContent, ValidationError,
};

use crate::commands::{current_document, open_document, resolve_block_id, resolve_id};
use crate::output::{short_id, table_lines, Output};

/// Table operations exposed on the command line
#[derive(Debug, Clone, PartialEq)]
pub enum TableOp {
    AddColumn {
        name: Option<String>,
        column_type: String,
    },
    DeleteColumn {
        column: String,
    },
    AddRow,
    DeleteRow {
        row: usize,
    },
    Set {
        row: usize,
        column: String,
        value: String,
    },
    Formula {
        row: usize,
        column: String,
        formula: String,
    },
    Indent {
        row: usize,
    },
    Outdent {
        row: usize,
    },
    Collapse {
        row: usize,
    },
}

/// Run a table operation against a table block and save the document
pub fn run<S: KeyValueStore>(
    store: &mut DocumentStore<S>,
    doc_id: String,
    block_id: String,
    op: TableOp,
    output: &Output,
) -> Result<()> {
    let doc_id = open_document(store, &doc_id)?;
    let doc = current_document(store)?;
    let block_id = resolve_block_id(doc, &block_id)?;

    // Column prefixes resolve against the table as it is before the edit
    let op = match table_of(doc, &block_id) {
        Some(table) => resolve_columns(&table, op)?,
        None => op,
    };

    let message = store
        .update_table(&block_id, |table| apply(table, op))?
        .ok_or_else(|| anyhow!("No document is open"))?;
    store
        .close_current_document()
        .context("Failed to save document")?;

    output.success(&message);
    if output.should_prompt() {
        let saved = store.storage().get_document(&doc_id);
        if let Some(table) = saved.and_then(|doc| table_of(&doc, &block_id)) {
            for line in table_lines(&table) {
                println!("    {}", line);
            }
        }
    }
    Ok(())
}

/// Apply an operation, returning a message describing it
fn apply(table: &mut TableContent, op: TableOp) -> Result<String, ValidationError> {
    let message = match op {
        TableOp::AddColumn { name, column_type } => {
            let column_type: ColumnType = column_type.parse().map_err(|details| {
                ValidationError::InvalidContent {
                    block_type: BlockType::Table,
                    details,
                }
            })?;
            let id = table.add_column(name, column_type);
            format!("Added column: {}", id)
        }
        TableOp::DeleteColumn { column } => {
            table.delete_column(&column)?;
            format!("Deleted column: {}", short_id(&column))
        }
        TableOp::AddRow => {
            table.add_row();
            format!("Added row {}", table.rows.len() - 1)
        }
        TableOp::DeleteRow { row } => {
            table.delete_row(row)?;
            format!("Deleted row {}", row)
        }
        TableOp::Set { row, column, value } => {
            table.update_cell_value(row, &column, parse_cell_value(&value))?;
            format!("Set cell {}:{}", row, short_id(&column))
        }
        TableOp::Formula {
            row,
            column,
            formula,
        } => {
            let formula = (!formula.is_empty()).then_some(formula);
            let cleared = formula.is_none();
            table.update_cell_formula(row, &column, formula)?;
            if cleared {
                format!("Cleared formula at {}:{}", row, short_id(&column))
            } else {
                format!("Set formula at {}:{}", row, short_id(&column))
            }
        }
        TableOp::Indent { row } => {
            table.indent_row(row)?;
            format!("Row {} is now at level {}", row, table.rows[row].level)
        }
        TableOp::Outdent { row } => {
            table.outdent_row(row)?;
            format!("Row {} is now at level {}", row, table.rows[row].level)
        }
        TableOp::Collapse { row } => {
            if table.toggle_collapsed(row)? {
                format!("Collapsed row {}", row)
            } else {
                format!("Expanded row {}", row)
            }
        }
    };
    Ok(message)
}

/// Replace column prefixes in an operation with full column ids
fn resolve_columns(table: &TableContent, op: TableOp) -> Result<TableOp> {
    let resolve = |column: String| {
        resolve_id(
            "column",
            &column,
            table
                .columns
                .iter()
                .map(|col| (col.id.as_str(), col.name.as_str())),
        )
    };

    Ok(match op {
        TableOp::DeleteColumn { column } => TableOp::DeleteColumn {
            column: resolve(column)?,
        },
        TableOp::Set { row, column, value } => TableOp::Set {
            row,
            column: resolve(column)?,
            value,
        },
        TableOp::Formula {
            row,
            column,
            formula,
        } => TableOp::Formula {
            row,
            column: resolve(column)?,
            formula,
        },
        other => other,
    })
}

/// Parse a cell value typed on the command line
///
/// `true`/`false` become booleans, numbers become numbers, `null` clears the
/// cell and anything else is text.
pub fn parse_cell_value(input: &str) -> CellValue {
    match input {
        "null" => CellValue::Null,
        "true" => CellValue::Bool(true),
        "false" => CellValue::Bool(false),
        _ => match input.parse::<f64>() {
            Ok(n) if n.is_finite() => CellValue::Number(n),
            _ => CellValue::Text(input.to_string()),
        },
    }
}

fn table_of(doc: &Document, block_id: &str) -> Option<TableContent> {
    match doc.block(block_id).map(|block| &block.content) {
        Some(BlockContent::Table(table)) => Some(table.clone()),
        _ => None,
    }
}
