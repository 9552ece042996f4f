//! Cell addressing and formula construction for the report worksheet

/// Builds the Excel formulas of the cost table from column positions
///
/// Rows passed to this type are Excel row numbers (1-based), columns are
/// 0-based indexes, matching how the exporter counts them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormulaTranslator {
    quantity_col: usize,
    price_col: usize,
    total_col: usize,
}

impl FormulaTranslator {
    /// Create a translator for the given quantity, unit price and total columns
    pub fn new(quantity_col: usize, price_col: usize, total_col: usize) -> Self {
        Self {
            quantity_col,
            price_col,
            total_col,
        }
    }

    /// Per-row total, e.g. row 6 → `=D6*F6`
    pub fn row_total(&self, row: u32) -> String {
        format!(
            "={}*{}",
            Self::cell_ref(self.quantity_col, row),
            Self::cell_ref(self.price_col, row)
        )
    }

    /// Grand total over the total column, e.g. `=SUM(G6:G8)`
    pub fn grand_total(&self, first_row: u32, last_row: u32) -> String {
        format!("=SUM({})", self.total_range(first_row, last_row))
    }

    /// Average line total, e.g. `=AVERAGE(G6:G8)`
    pub fn average(&self, first_row: u32, last_row: u32) -> String {
        format!("=AVERAGE({})", self.total_range(first_row, last_row))
    }

    /// Share of one row in the grand total, e.g. `=G6/$G$9`
    pub fn percentage(&self, row: u32, grand_total_row: u32) -> String {
        format!(
            "={}/{}",
            Self::cell_ref(self.total_col, row),
            Self::absolute_ref(self.total_col, grand_total_row)
        )
    }

    /// `G6:G8` for the total column
    pub fn total_range(&self, first_row: u32, last_row: u32) -> String {
        format!(
            "{}:{}",
            Self::cell_ref(self.total_col, first_row),
            Self::cell_ref(self.total_col, last_row)
        )
    }

    /// A1-style reference for a 0-based column and 1-based row
    pub fn cell_ref(col: usize, row: u32) -> String {
        format!("{}{}", Self::column_index_to_letter(col), row)
    }

    /// `$G$9` style absolute reference
    pub fn absolute_ref(col: usize, row: u32) -> String {
        format!("${}${}", Self::column_index_to_letter(col), row)
    }

    /// Parse `G12` or `$G$12` into a 0-based column and 1-based row
    pub fn parse_cell_ref(reference: &str) -> Option<(usize, u32)> {
        let reference = reference.trim();
        let letters: String = reference
            .chars()
            .filter(|c| *c != '$')
            .take_while(|c| c.is_ascii_alphabetic())
            .collect();
        if letters.is_empty() {
            return None;
        }

        let digits: String = reference
            .chars()
            .filter(|c| *c != '$')
            .skip(letters.len())
            .collect();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        let col = Self::letter_to_column_index(&letters)?;
        let row = digits.parse::<u32>().ok().filter(|r| *r > 0)?;
        Some((col, row))
    }

    /// Convert a column index to an Excel column letter
    ///
    /// Examples:
    /// - 0 → A
    /// - 1 → B
    /// - 25 → Z
    /// - 26 → AA
    pub fn column_index_to_letter(index: usize) -> String {
        let mut result = String::new();
        let mut idx = index;

        loop {
            let remainder = idx % 26;
            result.insert(0, (b'A' + remainder as u8) as char);
            if idx < 26 {
                break;
            }
            idx = idx / 26 - 1;
        }

        result
    }

    /// Inverse of [`FormulaTranslator::column_index_to_letter`]
    pub fn letter_to_column_index(letters: &str) -> Option<usize> {
        if letters.is_empty() {
            return None;
        }

        let mut index = 0usize;
        for ch in letters.chars() {
            if !ch.is_ascii_alphabetic() {
                return None;
            }
            let value = (ch.to_ascii_uppercase() as u8 - b'A') as usize + 1;
            index = index.checked_mul(26)?.checked_add(value)?;
        }

        Some(index - 1)
    }
}
