//! Stand-in host and settings surface for the desktop demo.

use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use rand::Rng;
use radial_gauge::{
    ColumnDescriptor, DataCell, DataRow, DataTable, DataType, DomainPolicy, GaugeSettings,
    HostEventKind, HostRuntime, ListenerId, ListenerRegistry, NumberFormat, SettingsDialog,
    TriggerSender,
};

pub enum DataSource {
    /// Re-reads a TOML summary table on every fetch.
    File(PathBuf),
    /// A fresh random `Sales`/`Target` row per fetch.
    Random,
}

pub struct DemoHost {
    source: DataSource,
    listeners: ListenerRegistry,
}

impl DemoHost {
    pub fn new(source: DataSource) -> Self {
        Self {
            source,
            listeners: ListenerRegistry::new(),
        }
    }

    /// Raises a host notification, as the dashboard would on a filter change.
    pub fn notify(&self, kind: HostEventKind) -> usize {
        let delivered = self.listeners.dispatch(kind);
        tracing::debug!(?kind, delivered, "host notification raised");
        delivered
    }
}

#[async_trait]
impl HostRuntime for DemoHost {
    async fn get_summary_data(&self) -> anyhow::Result<DataTable> {
        match &self.source {
            DataSource::File(path) => {
                let text = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("reading {}", path.display()))?;
                let table = toml::from_str(&text)
                    .with_context(|| format!("parsing {}", path.display()))?;
                Ok(table)
            }
            DataSource::Random => Ok(random_table()),
        }
    }

    fn add_event_listener(&self, kind: HostEventKind, sender: TriggerSender) -> ListenerId {
        self.listeners.add(kind, sender)
    }

    fn remove_event_listener(&self, id: ListenerId) {
        self.listeners.remove(id);
    }
}

fn random_table() -> DataTable {
    let mut rng = rand::rng();
    let sales = (rng.random_range(0.0..150.0_f64) * 10.0).round() / 10.0;
    let target = rng.random_range(60.0..120.0_f64).round();
    DataTable {
        columns: vec![
            ColumnDescriptor::new("Region", DataType::String),
            ColumnDescriptor::new("Sales", DataType::Float),
            ColumnDescriptor::new("Sales Target", DataType::Float),
        ],
        rows: vec![DataRow(vec![
            DataCell::text("All"),
            DataCell::number(sales),
            DataCell::number(target),
        ])],
    }
}

/// Which setting a key press flips.
#[derive(Debug, Clone, Copy)]
pub enum Toggle {
    Policy,
    NumberFormat,
}

/// Settings "dialog" that answers immediately with one setting flipped.
pub struct ToggleDialog(pub Toggle);

#[async_trait]
impl SettingsDialog for ToggleDialog {
    async fn open(&self, current: &GaugeSettings) -> anyhow::Result<Option<GaugeSettings>> {
        let mut settings = current.clone();
        match self.0 {
            Toggle::Policy => {
                settings.domain.policy = match settings.domain.policy {
                    DomainPolicy::FixedTarget => DomainPolicy::FullRange,
                    DomainPolicy::FullRange => DomainPolicy::FixedTarget,
                };
            }
            Toggle::NumberFormat => {
                settings.number_format = match settings.number_format {
                    NumberFormat::Locale => NumberFormat::Abbreviated,
                    NumberFormat::Abbreviated => NumberFormat::Locale,
                };
            }
        }
        Ok(Some(settings))
    }
}
