//! Locale-aware number formatting shared by every export
//!
//! Both the Word document and the terminal preview format money through
//! [`CurrencyFormat`], and the Excel exporter derives its cell number format
//! from the same configuration, so rounding and symbols never diverge.

/// Currency and digit-grouping rules for one locale
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyFormat {
    /// Symbol placed before the amount, separated by a space
    pub symbol: String,
    pub thousands_separator: char,
    pub decimal_separator: char,
    /// Fraction digits shown for money amounts
    pub fraction_digits: usize,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self::idr()
    }
}

impl CurrencyFormat {
    /// Indonesian Rupiah, no fraction digits (`Rp 1.500.000`)
    pub fn idr() -> Self {
        Self {
            symbol: "Rp".to_string(),
            thousands_separator: '.',
            decimal_separator: ',',
            fraction_digits: 0,
        }
    }

    /// Format a money amount, e.g. `Rp 1.500.000` or `-Rp 5.000`
    ///
    /// Non-finite values format as zero.
    pub fn format(&self, value: f64) -> String {
        let value = if value.is_finite() { value } else { 0.0 };
        let digits = self.group(value.abs(), self.fraction_digits);
        let sign = if value < 0.0 && has_nonzero_digit(&digits) {
            "-"
        } else {
            ""
        };
        format!("{}{} {}", sign, self.symbol, digits)
    }

    /// Format a quantity with grouping and every significant fraction digit
    ///
    /// Quantities are never rounded: `1500.0` → `1.500`, `2.5` → `2,5`,
    /// `0.125` → `0,125`.
    pub fn format_quantity(&self, value: f64) -> String {
        let value = if value.is_finite() { value } else { 0.0 };
        let digits = self.group_digits(&value.abs().to_string());

        if value < 0.0 && has_nonzero_digit(&digits) {
            format!("-{}", digits)
        } else {
            digits
        }
    }

    /// Excel number format matching [`CurrencyFormat::format`]
    pub fn excel_num_format(&self) -> String {
        let symbol = self.symbol.replace('"', "\"\"");
        if self.fraction_digits == 0 {
            format!("\"{} \"#,##0", symbol)
        } else {
            format!("\"{} \"#,##0.{}", symbol, "0".repeat(self.fraction_digits))
        }
    }

    /// Round to `fraction_digits` and insert locale separators
    fn group(&self, value: f64, fraction_digits: usize) -> String {
        self.group_digits(&format!("{:.*}", fraction_digits, value))
    }

    /// Insert locale separators into a plain `1234.5` digit string
    fn group_digits(&self, fixed: &str) -> String {
        let (int_part, frac_part) = match fixed.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (fixed, None),
        };

        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (idx, ch) in int_part.chars().enumerate() {
            if idx > 0 && (int_part.len() - idx) % 3 == 0 {
                grouped.push(self.thousands_separator);
            }
            grouped.push(ch);
        }

        if let Some(frac) = frac_part {
            grouped.push(self.decimal_separator);
            grouped.push_str(frac);
        }

        grouped
    }
}

/// Percentage share with two decimals, `0%` when `whole` is zero
pub fn format_percentage(part: f64, whole: f64) -> String {
    if whole == 0.0 || !whole.is_finite() {
        return "0%".to_string();
    }
    format!("{:.2}%", part / whole * 100.0)
}

fn has_nonzero_digit(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit() && c != '0')
}
