use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// Category key used for items whose category is blank
pub const UNSPECIFIED_CATEGORY: &str = "-";

//==============================================================================
// Report Model
//==============================================================================

/// Report header fields shown above the cost table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Report name, also the base of the exported filename
    #[serde(default, alias = "nama")]
    pub title: String,

    /// Calendar date as entered (`YYYY-MM-DD` by convention)
    #[serde(default = "today", alias = "tanggal")]
    pub date: String,
}

impl ReportMetadata {
    pub fn new(title: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            date: date.into(),
        }
    }
}

impl Default for ReportMetadata {
    fn default() -> Self {
        Self::new("", today())
    }
}

fn today() -> String {
    chrono::Local::now().date_naive().format("%Y-%m-%d").to_string()
}

/// One row of the cost table
///
/// The line total is never stored: it is always recomputed from
/// `quantity` and `unit_price` so it cannot go stale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// User-supplied row label; blank means "use the 1-based position"
    #[serde(default, alias = "no")]
    pub sequence_label: String,

    #[serde(default, alias = "kategori")]
    pub category: String,

    #[serde(default, alias = "keterangan")]
    pub description: String,

    #[serde(default, alias = "jumlah", deserialize_with = "lenient_number")]
    pub quantity: Option<f64>,

    #[serde(default, alias = "satuan")]
    pub unit: String,

    #[serde(default, alias = "harga", deserialize_with = "lenient_number")]
    pub unit_price: Option<f64>,
}

impl LineItem {
    pub fn new(
        category: impl Into<String>,
        description: impl Into<String>,
        quantity: f64,
        unit: impl Into<String>,
        unit_price: f64,
    ) -> Self {
        Self {
            sequence_label: String::new(),
            category: category.into(),
            description: description.into(),
            quantity: Some(quantity),
            unit: unit.into(),
            unit_price: Some(unit_price),
        }
    }

    /// Set an explicit row label (builder style)
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.sequence_label = label.into();
        self
    }

    /// Quantity with blank and non-finite values coerced to 0
    pub fn quantity_or_zero(&self) -> f64 {
        finite_or_zero(self.quantity)
    }

    /// Unit price with blank and non-finite values coerced to 0
    pub fn unit_price_or_zero(&self) -> f64 {
        finite_or_zero(self.unit_price)
    }

    /// `quantity * unit_price`, recomputed on every call
    pub fn line_total(&self) -> f64 {
        finite_or_zero(Some(self.quantity_or_zero() * self.unit_price_or_zero()))
    }

    /// Row label for the item at `index` (0-based) in its report
    pub fn label_at(&self, index: usize) -> String {
        let label = self.sequence_label.trim();
        if label.is_empty() {
            (index + 1).to_string()
        } else {
            label.to_string()
        }
    }

    /// Whether the row label falls back to the item position
    pub fn has_blank_label(&self) -> bool {
        self.sequence_label.trim().is_empty()
    }

    /// Category used for aggregation
    pub fn category_key(&self) -> &str {
        let category = self.category.trim();
        if category.is_empty() {
            UNSPECIFIED_CATEGORY
        } else {
            category
        }
    }
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    match value {
        Some(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

/// Accept numbers, numeric strings, blanks, null and junk.
/// Anything that is not a finite number becomes `None`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawNumber {
        Number(f64),
        Text(String),
        Other(IgnoredAny),
    }

    let parsed = match Option::<RawNumber>::deserialize(deserializer)? {
        Some(RawNumber::Number(n)) => Some(n),
        Some(RawNumber::Text(text)) => text.trim().parse::<f64>().ok(),
        Some(RawNumber::Other(_)) | None => None,
    };

    Ok(parsed.filter(|n| n.is_finite()))
}

/// The full snapshot handed to a generator for one export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default, alias = "meta")]
    pub metadata: ReportMetadata,

    /// Rows in user order; exports never re-sort them
    #[serde(default, alias = "rows")]
    pub items: Vec<LineItem>,
}

impl Report {
    pub fn new(metadata: ReportMetadata) -> Self {
        Self {
            metadata,
            items: Vec::new(),
        }
    }

    pub fn add_item(&mut self, item: LineItem) {
        self.items.push(item);
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn line_totals(&self) -> Vec<f64> {
        self.items.iter().map(LineItem::line_total).collect()
    }

    /// Sum of the line totals; an overflowing sum is coerced to 0
    pub fn grand_total(&self) -> f64 {
        finite_or_zero(Some(self.items.iter().map(LineItem::line_total).sum()))
    }

    /// Totals per category, in order of first appearance
    pub fn category_totals(&self) -> Vec<CategoryTotal> {
        let mut totals: Vec<CategoryTotal> = Vec::new();

        for item in &self.items {
            let key = item.category_key();
            match totals.iter_mut().find(|t| t.category == key) {
                Some(entry) => entry.total += item.line_total(),
                None => totals.push(CategoryTotal {
                    category: key.to_string(),
                    total: item.line_total(),
                }),
            }
        }

        for entry in &mut totals {
            entry.total = finite_or_zero(Some(entry.total));
        }
        totals
    }

    /// Share of the grand total for `category`, in `0.0..=1.0`
    ///
    /// Returns 0 when the grand total is 0 or the category is unknown.
    /// A blank `category` addresses the unspecified group.
    pub fn category_percentage(&self, category: &str) -> f64 {
        let grand_total = self.grand_total();
        if grand_total == 0.0 {
            return 0.0;
        }

        let key = match category.trim() {
            "" => UNSPECIFIED_CATEGORY,
            other => other,
        };

        self.category_totals()
            .iter()
            .find(|t| t.category == key)
            .map(|t| t.total / grand_total)
            .unwrap_or(0.0)
    }
}

/// Aggregate for one category label
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}
