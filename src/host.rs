//! Contracts with the dashboard host and the settings surface.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::config::GaugeSettings;
use crate::data::DataTable;
use crate::render::Viewport;

/// Host notifications the gauge listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostEventKind {
    FilterChanged,
    SelectionChanged,
    SummaryDataChanged,
}

impl HostEventKind {
    pub const ALL: [HostEventKind; 3] = [
        HostEventKind::FilterChanged,
        HostEventKind::SelectionChanged,
        HostEventKind::SummaryDataChanged,
    ];
}

/// Something that makes the bridge reload, redraw or stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    Host(HostEventKind),
    Resize(Viewport),
    Teardown,
}

pub type TriggerSender = mpsc::UnboundedSender<Trigger>;
pub type TriggerReceiver = mpsc::UnboundedReceiver<Trigger>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

#[async_trait]
pub trait HostRuntime: Send + Sync {
    /// The summarized data table behind the worksheet.
    async fn get_summary_data(&self) -> anyhow::Result<DataTable>;

    /// Delivers `kind` notifications to `sender` until removed.
    fn add_event_listener(&self, kind: HostEventKind, sender: TriggerSender) -> ListenerId;

    fn remove_event_listener(&self, id: ListenerId);
}

/// The external settings surface opened by `configure()`.
#[async_trait]
pub trait SettingsDialog: Send + Sync {
    /// Resolves with new settings, or `None` when the user cancels.
    async fn open(&self, current: &GaugeSettings) -> anyhow::Result<Option<GaugeSettings>>;
}

// ============================================================================
// LISTENER REGISTRY
// ============================================================================

/// Listener bookkeeping for [`HostRuntime`] implementations.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: Mutex<BTreeMap<ListenerId, (HostEventKind, TriggerSender)>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, kind: HostEventKind, sender: TriggerSender) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().insert(id, (kind, sender));
        id
    }

    pub fn remove(&self, id: ListenerId) -> bool {
        self.lock().remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sends `kind` to every listener registered for it and returns how many
    /// received it. Listeners whose receiver is gone are dropped.
    pub fn dispatch(&self, kind: HostEventKind) -> usize {
        let mut listeners = self.lock();
        let mut delivered = 0;
        listeners.retain(|id, (listener_kind, sender)| {
            if *listener_kind != kind {
                return true;
            }
            match sender.send(Trigger::Host(kind)) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => {
                    tracing::debug!(?id, ?kind, "dropping listener with closed receiver");
                    false
                }
            }
        });
        delivered
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<ListenerId, (HostEventKind, TriggerSender)>> {
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
