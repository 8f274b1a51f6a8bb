//! Wide input table

/// Raw wide table: one header, one row of string cells per timestamp.
///
/// Cells are kept as text so the reshaper decides what counts as a
/// timestamp or a missing value. Every row has exactly `header.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WideTable {
    pub header: Vec<String>,
    pub rows: Vec<WideRow>,
}

/// One data row and the source line it came from (1-based, header is line 1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideRow {
    pub line: usize,
    pub cells: Vec<String>,
}

impl WideTable {
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the header width
    pub fn push_row(&mut self, line: usize, mut cells: Vec<String>) {
        cells.resize(self.header.len(), String::new());
        self.rows.push(WideRow { line, cells });
    }

    /// Case-insensitive column lookup
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = name.trim();
        self.header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(wanted))
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
