use serde::Deserialize;

use crate::columns::ResolvedColumns;

/// Declared type of a summary-data column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataType {
    Int,
    Float,
    String,
    Bool,
    Date,
    DateTime,
}

impl DataType {
    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Int | DataType::Float)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: DataType,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Raw cell payload as handed over by the host.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataCell {
    pub value: Option<CellValue>,
    #[serde(default)]
    pub formatted: Option<String>,
}

impl DataCell {
    pub fn number(value: f64) -> Self {
        Self {
            value: Some(CellValue::Number(value)),
            formatted: None,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: Some(CellValue::Text(value.into())),
            formatted: None,
        }
    }

    pub fn null() -> Self {
        Self {
            value: None,
            formatted: None,
        }
    }

    /// Numeric reading of the cell: numbers as-is, text trimmed and parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self.value.as_ref()? {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Number(_) => None,
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            CellValue::Bool(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct DataRow(pub Vec<DataCell>);

impl DataRow {
    pub fn cell(&self, index: usize) -> Option<&DataCell> {
        self.0.get(index)
    }

    pub fn number_at(&self, index: usize) -> Option<f64> {
        self.cell(index).and_then(DataCell::as_f64)
    }
}

/// Result of a host summary-data fetch.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DataTable {
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    pub rows: Vec<DataRow>,
}

impl DataTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every parseable value of one column, in row order.
    pub fn column_values(&self, index: usize) -> Vec<f64> {
        self.rows
            .iter()
            .filter_map(|row| row.number_at(index))
            .collect()
    }
}

/// Values driving the gauge, replaced wholesale on every successful load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeState {
    pub current_value: f64,
    pub target_value: Option<f64>,
}

impl GaugeState {
    /// Reads the first row. An unparseable current value reads as 0 and an
    /// unparseable target as absent.
    pub fn from_table(table: &DataTable, columns: ResolvedColumns) -> Option<Self> {
        let row = table.rows.first()?;
        let current_value = row.number_at(columns.value_index).unwrap_or_else(|| {
            tracing::warn!(
                column = columns.value_index,
                "current value is not numeric, using 0"
            );
            0.0
        });
        let target_value = columns
            .target_index
            .and_then(|index| row.number_at(index));
        Some(Self {
            current_value,
            target_value,
        })
    }
}
