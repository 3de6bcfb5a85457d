use crate::data::ColumnDescriptor;
use crate::error::GaugeError;

/// Column names containing any of these (case-insensitive) hold the target.
const TARGET_SYNONYMS: [&str; 4] = ["target", "objetivo", "goal", "meta"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub value_index: usize,
    pub target_index: Option<usize>,
}

/// Picks the measure columns that drive the gauge.
///
/// The first numeric column is the current value and the next numeric column is
/// the target. A numeric column whose name looks like a target wins over that
/// positional choice.
pub fn resolve_columns(columns: &[ColumnDescriptor]) -> Result<ResolvedColumns, GaugeError> {
    let mut numeric = columns
        .iter()
        .enumerate()
        .filter(|(_, column)| column.data_type.is_numeric())
        .map(|(index, _)| index);

    let value_index = numeric.next().ok_or(GaugeError::NoMeasureFound)?;
    let positional_target = numeric.next();

    let named_target = columns
        .iter()
        .enumerate()
        .filter(|(index, column)| *index != value_index && column.data_type.is_numeric())
        .find(|(_, column)| is_target_name(&column.name))
        .map(|(index, _)| index);

    let resolved = ResolvedColumns {
        value_index,
        target_index: named_target.or(positional_target),
    };
    tracing::debug!(
        value_index = resolved.value_index,
        target_index = ?resolved.target_index,
        by_name = named_target.is_some(),
        "resolved gauge columns"
    );
    Ok(resolved)
}

fn is_target_name(name: &str) -> bool {
    let lowered = name.to_lowercase();
    TARGET_SYNONYMS.iter().any(|synonym| lowered.contains(synonym))
}
