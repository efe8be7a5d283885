use std::sync::Arc;

use tracing::debug;

use super::data::{seed_rows, Column, SalaryRow};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("unknown column `{0}`")]
    UnknownColumn(String),
    #[error("row {row} out of range ({len} rows)")]
    RowOutOfRange { row: usize, len: usize },
}

/// Process-local editable table. Rows are shared `Arc`s so a commit only
/// allocates the edited row and a new outer slice; every other row keeps
/// its identity.
#[derive(Debug, Clone)]
pub struct SalaryGrid {
    rows: Arc<[Arc<SalaryRow>]>,
    page_size: usize,
}

impl SalaryGrid {
    pub fn new(rows: Vec<SalaryRow>, page_size: usize) -> Self {
        Self {
            rows: rows.into_iter().map(Arc::new).collect(),
            page_size,
        }
    }

    pub fn seeded(page_size: usize) -> Self {
        Self::new(seed_rows(), page_size)
    }

    pub fn columns(&self) -> &'static [Column] {
        &Column::ALL
    }

    pub fn rows(&self) -> &Arc<[Arc<SalaryRow>]> {
        &self.rows
    }

    /// The rendered page: the first `page_size` rows.
    pub fn visible(&self) -> &[Arc<SalaryRow>] {
        &self.rows[..self.rows.len().min(self.page_size)]
    }

    fn locate(&self, row: usize, column: &str) -> Result<(&Arc<SalaryRow>, Column), GridError> {
        let column =
            Column::from_key(column).ok_or_else(|| GridError::UnknownColumn(column.to_string()))?;
        let current = self.rows.get(row).ok_or(GridError::RowOutOfRange {
            row,
            len: self.rows.len(),
        })?;
        Ok((current, column))
    }

    pub fn value(&self, row: usize, column: &str) -> Result<&str, GridError> {
        let (current, column) = self.locate(row, column)?;
        Ok(current.get(column))
    }

    /// Write `value` verbatim into one cell. Unknown columns are rejected
    /// rather than added to the row.
    pub fn commit(
        &mut self,
        row: usize,
        column: &str,
        value: impl Into<String>,
    ) -> Result<Arc<SalaryRow>, GridError> {
        let (current, column) = self.locate(row, column)?;
        let updated = Arc::new(current.with(column, value.into()));
        self.rows = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, r)| if i == row { updated.clone() } else { r.clone() })
            .collect();
        debug!(row, column = column.key(), "salary cell committed");
        Ok(updated)
    }
}

/// Transient text of one cell while it is being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellEditor {
    row: usize,
    column: String,
    initial: String,
    value: String,
}

impl CellEditor {
    pub fn begin(grid: &SalaryGrid, row: usize, column: &str) -> Result<Self, GridError> {
        let initial = grid.value(row, column)?.to_string();
        Ok(Self {
            row,
            column: column.to_string(),
            value: initial.clone(),
            initial,
        })
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn input(&mut self, text: impl Into<String>) {
        self.value = text.into();
    }

    /// Follow the underlying cell when it changed outside this editor.
    pub fn sync(&mut self, grid: &SalaryGrid) -> Result<(), GridError> {
        let current = grid.value(self.row, &self.column)?;
        if current != self.initial {
            self.initial = current.to_string();
            self.value = current.to_string();
        }
        Ok(())
    }

    /// Focus lost: commit the transient text into the grid.
    pub fn blur(&mut self, grid: &mut SalaryGrid) -> Result<Arc<SalaryRow>, GridError> {
        let row = grid.commit(self.row, &self.column, self.value.clone())?;
        self.initial = self.value.clone();
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_is_first_page() {
        let grid = SalaryGrid::seeded(10);
        assert_eq!(grid.visible().len(), 10);
        assert!(grid.rows().len() > 10);
        assert!(Arc::ptr_eq(&grid.visible()[0], &grid.rows()[0]));

        let small = SalaryGrid::new(seed_rows().into_iter().take(3).collect(), 10);
        assert_eq!(small.visible().len(), 3);
    }

    #[test]
    fn commit_replaces_only_the_target_row_and_field() {
        let mut grid = SalaryGrid::seeded(10);
        let before = grid.rows().clone();

        grid.commit(0, "fullName", "Ada Obi").unwrap();

        assert!(!Arc::ptr_eq(&before, grid.rows()));
        assert!(!Arc::ptr_eq(&before[0], &grid.rows()[0]));
        assert_eq!(grid.rows()[0].full_name, "Ada Obi");
        assert_eq!(grid.rows()[0].email, before[0].email);
        assert_eq!(grid.rows()[0].age, before[0].age);
        assert_eq!(before[0].full_name, "Korrie O'Crevy");
        for i in 1..10 {
            assert!(Arc::ptr_eq(&before[i], &grid.rows()[i]));
            assert_eq!(before[i], grid.rows()[i]);
        }
    }

    #[test]
    fn commit_accepts_any_text_verbatim() {
        let mut grid = SalaryGrid::seeded(10);
        grid.commit(2, "age", "  not a number ").unwrap();
        assert_eq!(grid.value(2, "age").unwrap(), "  not a number ");
    }

    #[test]
    fn unknown_column_is_rejected() {
        let mut grid = SalaryGrid::seeded(10);
        let before = grid.rows().clone();
        assert_eq!(
            grid.commit(0, "salary", "100"),
            Err(GridError::UnknownColumn("salary".into()))
        );
        assert!(Arc::ptr_eq(&before, grid.rows()));
    }

    #[test]
    fn row_out_of_range_is_rejected() {
        let mut grid = SalaryGrid::seeded(10);
        let len = grid.rows().len();
        assert_eq!(
            grid.commit(len, "email", "x"),
            Err(GridError::RowOutOfRange { row: len, len })
        );
    }

    #[test]
    fn editor_commits_on_blur_only() {
        let mut grid = SalaryGrid::seeded(10);
        let mut editor = CellEditor::begin(&grid, 1, "email").unwrap();
        editor.input("bailie@example.com");
        assert_eq!(grid.value(1, "email").unwrap(), "bcoulman1@yolasite.com");

        editor.blur(&mut grid).unwrap();
        assert_eq!(grid.value(1, "email").unwrap(), "bailie@example.com");
    }

    #[test]
    fn two_cells_of_one_row_both_land() {
        let mut grid = SalaryGrid::seeded(10);
        let mut name = CellEditor::begin(&grid, 0, "fullName").unwrap();
        let mut age = CellEditor::begin(&grid, 0, "age").unwrap();
        name.input("Ada Obi");
        age.input("40");

        name.blur(&mut grid).unwrap();
        age.blur(&mut grid).unwrap();

        assert_eq!(grid.rows()[0].full_name, "Ada Obi");
        assert_eq!(grid.rows()[0].age, "40");
    }

    #[test]
    fn editor_follows_external_changes() {
        let mut grid = SalaryGrid::seeded(10);
        let mut editor = CellEditor::begin(&grid, 3, "experience").unwrap();
        grid.commit(3, "experience", "4 Years").unwrap();

        editor.sync(&grid).unwrap();
        assert_eq!(editor.value(), "4 Years");
    }

    #[test]
    fn editor_for_unknown_column_fails() {
        let grid = SalaryGrid::seeded(10);
        assert!(matches!(
            CellEditor::begin(&grid, 0, "bonus"),
            Err(GridError::UnknownColumn(_))
        ));
    }
}
