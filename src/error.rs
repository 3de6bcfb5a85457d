use thiserror::Error;

/// Failures that replace the gauge with a message. None of them are fatal:
/// the bridge stays subscribed and the next trigger retries the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GaugeError {
    #[error("no data available: drag a measure onto the Marks card")]
    NoDataAvailable,
    #[error("no numeric measure found in the summary data")]
    NoMeasureFound,
    #[error("error loading data: {0}")]
    HostFetchFailed(String),
}

impl GaugeError {
    pub(crate) fn host_fetch(err: anyhow::Error) -> Self {
        // `{:#}` keeps the whole context chain on one line
        GaugeError::HostFetchFailed(format!("{err:#}"))
    }

    /// Text shown in place of the drawing.
    pub fn user_message(&self) -> String {
        match self {
            GaugeError::NoDataAvailable => "Drag a measure onto the Marks card.".to_string(),
            GaugeError::NoMeasureFound => {
                "The summary data has no numeric measure to display.".to_string()
            }
            GaugeError::HostFetchFailed(cause) => format!("Error loading data: {cause}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_fetch_keeps_context_chain() {
        let err = anyhow::anyhow!("connection reset").context("getSummaryData rejected");
        let gauge_err = GaugeError::host_fetch(err);
        assert_eq!(
            gauge_err.user_message(),
            "Error loading data: getSummaryData rejected: connection reset"
        );
    }

    #[test]
    fn messages_differ_per_kind() {
        assert_ne!(
            GaugeError::NoDataAvailable.user_message(),
            GaugeError::NoMeasureFound.user_message()
        );
    }
}
