use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use radial_gauge::{
    ActiveFlag, ColumnDescriptor, DataBridge, DataCell, DataRow, DataTable, DataType,
    DomainPolicy, DrawingSurface, GaugeError, GaugeSettings, HostEventKind, HostRuntime,
    ListenerId, ListenerRegistry, Primitive, Scene, SettingsDialog, Trigger, TriggerReceiver,
    TriggerSender, ViewState, Viewport,
};
use tokio::sync::mpsc;

// ============================================================================
// FAKES
// ============================================================================

#[derive(Default)]
struct FakeHost {
    /// The last queued response is repeated once the others are used up.
    responses: Mutex<VecDeque<Result<DataTable, String>>>,
    fetches: AtomicUsize,
    registry: ListenerRegistry,
    deactivate_on_fetch: Mutex<Option<ActiveFlag>>,
}

impl FakeHost {
    fn with(responses: Vec<Result<DataTable, String>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        })
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostRuntime for FakeHost {
    async fn get_summary_data(&self) -> anyhow::Result<DataTable> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(flag) = self.deactivate_on_fetch.lock().unwrap().take() {
            flag.deactivate();
        }
        let mut responses = self.responses.lock().unwrap();
        let response = if responses.len() > 1 {
            responses.pop_front().unwrap()
        } else {
            responses.front().cloned().unwrap_or_else(|| Ok(DataTable::default()))
        };
        response.map_err(|cause| anyhow::anyhow!(cause))
    }

    fn add_event_listener(&self, kind: HostEventKind, sender: TriggerSender) -> ListenerId {
        self.registry.add(kind, sender)
    }

    fn remove_event_listener(&self, id: ListenerId) {
        self.registry.remove(id);
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Shown {
    Scene(Scene),
    Message(String),
}

#[derive(Default)]
struct RecordingSurface {
    shown: Vec<Shown>,
}

impl RecordingSurface {
    fn scenes(&self) -> usize {
        self.shown.iter().filter(|s| matches!(s, Shown::Scene(_))).count()
    }

    fn last_message(&self) -> Option<&str> {
        self.shown.iter().rev().find_map(|s| match s {
            Shown::Message(message) => Some(message.as_str()),
            Shown::Scene(_) => None,
        })
    }
}

impl DrawingSurface for RecordingSurface {
    fn present(&mut self, scene: Scene) {
        self.shown.push(Shown::Scene(scene));
    }

    fn show_message(&mut self, message: &str) {
        self.shown.push(Shown::Message(message.to_string()));
    }
}

struct FixedDialog(Option<GaugeSettings>);

#[async_trait]
impl SettingsDialog for FixedDialog {
    async fn open(&self, _current: &GaugeSettings) -> anyhow::Result<Option<GaugeSettings>> {
        Ok(self.0.clone())
    }
}

// ============================================================================
// HELPERS
// ============================================================================

const VIEWPORT: Viewport = Viewport::new(400.0, 300.0);

fn sales_table(sales: f64, target: f64) -> DataTable {
    DataTable {
        columns: vec![
            ColumnDescriptor::new("Region", DataType::String),
            ColumnDescriptor::new("SUM(Sales)", DataType::Float),
            ColumnDescriptor::new("Sales Target", DataType::Float),
        ],
        rows: vec![DataRow(vec![
            DataCell::text("All"),
            DataCell::number(sales),
            DataCell::number(target),
        ])],
    }
}

fn bridge(host: &Arc<FakeHost>) -> DataBridge<FakeHost, RecordingSurface> {
    DataBridge::new(
        host.clone(),
        RecordingSurface::default(),
        GaugeSettings::default(),
        VIEWPORT,
    )
}

fn needle_count(scene: &Scene) -> usize {
    scene
        .primitives()
        .iter()
        .filter(|p| matches!(p, Primitive::Line { tapered: true, .. }))
        .count()
}

// ============================================================================
// TESTS
// ============================================================================

#[tokio::test]
async fn successful_load_renders_gauge() {
    let host = FakeHost::with(vec![Ok(sales_table(72.5, 90.0))]);
    let mut bridge = bridge(&host);
    let _triggers = bridge.initialize().await;

    assert_eq!(bridge.view_state(), &ViewState::Rendered);
    let state = bridge.state().copied().unwrap();
    assert_eq!(state.current_value, 72.5);
    assert_eq!(state.target_value, Some(90.0));
    assert_eq!(bridge.config().min_value, 0.0);
    assert!((bridge.config().max_value - 99.0).abs() < 1e-9);

    match bridge.surface().shown.as_slice() {
        [Shown::Scene(scene)] => assert_eq!(needle_count(scene), 1),
        other => panic!("expected a single scene, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_table_shows_no_data_message() {
    let host = FakeHost::with(vec![Ok(DataTable {
        columns: vec![ColumnDescriptor::new("SUM(Sales)", DataType::Float)],
        rows: Vec::new(),
    })]);
    let mut bridge = bridge(&host);
    let _triggers = bridge.initialize().await;

    assert_eq!(
        bridge.view_state(),
        &ViewState::Error(GaugeError::NoDataAvailable)
    );
    assert_eq!(bridge.surface().scenes(), 0);
    assert_eq!(
        bridge.surface().last_message(),
        Some("Drag a measure onto the Marks card.")
    );
}

#[tokio::test]
async fn table_without_measures_shows_message() {
    let host = FakeHost::with(vec![Ok(DataTable {
        columns: vec![ColumnDescriptor::new("Region", DataType::String)],
        rows: vec![DataRow(vec![DataCell::text("West")])],
    })]);
    let mut bridge = bridge(&host);
    let _triggers = bridge.initialize().await;

    assert_eq!(
        bridge.view_state(),
        &ViewState::Error(GaugeError::NoMeasureFound)
    );
    assert_eq!(bridge.surface().scenes(), 0);
}

#[tokio::test]
async fn host_failure_message_carries_cause() {
    let host = FakeHost::with(vec![Err("worksheet unavailable".to_string())]);
    let mut bridge = bridge(&host);
    let _triggers = bridge.initialize().await;

    assert!(matches!(
        bridge.view_state(),
        ViewState::Error(GaugeError::HostFetchFailed(_))
    ));
    let message = bridge.surface().last_message().unwrap();
    assert!(message.starts_with("Error loading data"), "{message}");
    assert!(message.contains("worksheet unavailable"), "{message}");
}

#[tokio::test]
async fn error_clears_once_data_arrives() {
    let host = FakeHost::with(vec![
        Err("timeout".to_string()),
        Ok(sales_table(10.0, 20.0)),
    ]);
    let mut bridge = bridge(&host);
    let _triggers = bridge.initialize().await;
    assert!(matches!(bridge.view_state(), ViewState::Error(_)));

    bridge.handle(Trigger::Host(HostEventKind::FilterChanged)).await;
    assert_eq!(bridge.view_state(), &ViewState::Rendered);
    assert!(matches!(bridge.surface().shown.last(), Some(Shown::Scene(_))));
}

#[tokio::test]
async fn resize_redraws_without_fetching() {
    let host = FakeHost::with(vec![Ok(sales_table(50.0, 80.0))]);
    let mut bridge = bridge(&host);
    let _triggers = bridge.initialize().await;
    assert_eq!(host.fetches(), 1);

    bridge.handle(Trigger::Resize(Viewport::new(800.0, 600.0))).await;
    assert_eq!(host.fetches(), 1);
    assert_eq!(bridge.surface().scenes(), 2);
    assert_eq!(bridge.viewport(), Viewport::new(800.0, 600.0));

    let Some(Shown::Scene(first)) = bridge.surface().shown.first() else {
        panic!("expected a scene");
    };
    let Some(Shown::Scene(second)) = bridge.surface().shown.last() else {
        panic!("expected a scene");
    };
    assert_ne!(first, second);
}

#[tokio::test]
async fn resize_in_error_state_repeats_message() {
    let host = FakeHost::with(vec![Ok(DataTable::default())]);
    let mut bridge = bridge(&host);
    let _triggers = bridge.initialize().await;

    bridge.resize(Viewport::new(100.0, 100.0));
    assert_eq!(host.fetches(), 1);
    assert_eq!(bridge.surface().shown.len(), 2);
    assert_eq!(bridge.surface().scenes(), 0);
}

#[tokio::test]
async fn teardown_during_fetch_leaves_surface_untouched() {
    let host = FakeHost::with(vec![Ok(sales_table(50.0, 80.0))]);
    let mut bridge = bridge(&host);
    *host.deactivate_on_fetch.lock().unwrap() = Some(bridge.active_flag());

    let _triggers = bridge.initialize().await;

    assert_eq!(host.fetches(), 1);
    assert!(bridge.surface().shown.is_empty());
    assert!(bridge.state().is_none());
    assert_ne!(bridge.view_state(), &ViewState::Rendered);

    bridge.handle(Trigger::Host(HostEventKind::SummaryDataChanged)).await;
    assert_eq!(host.fetches(), 1);
}

#[tokio::test]
async fn configure_applies_new_policy_and_reloads() {
    let host = FakeHost::with(vec![Ok(sales_table(72.5, 90.0))]);
    let mut bridge = bridge(&host);
    let _triggers = bridge.initialize().await;

    let mut settings = bridge.settings().clone();
    settings.domain.policy = DomainPolicy::FullRange;
    bridge.configure(&FixedDialog(Some(settings))).await;

    assert_eq!(host.fetches(), 2);
    assert_eq!(bridge.settings().domain.policy, DomainPolicy::FullRange);
    // max(72.5, 90) * 1.2
    assert!((bridge.config().max_value - 108.0).abs() < 1e-9);
    assert_eq!(bridge.surface().scenes(), 2);
}

#[tokio::test]
async fn cancelled_or_invalid_settings_change_nothing() {
    let host = FakeHost::with(vec![Ok(sales_table(72.5, 90.0))]);
    let mut bridge = bridge(&host);
    let _triggers = bridge.initialize().await;
    let before = bridge.settings().clone();

    bridge.configure(&FixedDialog(None)).await;

    let mut invalid = before.clone();
    invalid.gauge.inner_radius_ratio = 2.0;
    bridge.configure(&FixedDialog(Some(invalid))).await;

    assert_eq!(host.fetches(), 1);
    assert_eq!(bridge.settings(), &before);
}

#[tokio::test]
async fn dispose_unsubscribes_every_listener() {
    let host = FakeHost::with(vec![Ok(sales_table(1.0, 2.0))]);
    let mut bridge = bridge(&host);
    let _triggers = bridge.initialize().await;
    assert_eq!(host.registry.len(), HostEventKind::ALL.len());

    bridge.dispose();
    assert!(host.registry.is_empty());
    assert!(!bridge.active_flag().is_active());

    bridge.dispose();
    assert!(host.registry.is_empty());
}

#[tokio::test]
async fn host_notifications_reach_the_bridge() {
    let host = FakeHost::with(vec![Ok(sales_table(1.0, 2.0))]);
    let mut bridge = bridge(&host);
    let mut triggers = bridge.initialize().await;

    for kind in HostEventKind::ALL {
        assert_eq!(host.registry.dispatch(kind), 1);
    }
    while let Ok(trigger) = triggers.try_recv() {
        bridge.handle(trigger).await;
    }
    assert_eq!(host.fetches(), 1 + HostEventKind::ALL.len());
}

#[tokio::test]
async fn run_stops_at_teardown() {
    let host = FakeHost::with(vec![Ok(sales_table(30.0, 60.0))]);
    let mut bridge = bridge(&host);
    let (tx, rx): (TriggerSender, TriggerReceiver) = mpsc::unbounded_channel();

    tx.send(Trigger::Host(HostEventKind::SummaryDataChanged)).unwrap();
    tx.send(Trigger::Resize(Viewport::new(200.0, 200.0))).unwrap();
    tx.send(Trigger::Host(HostEventKind::FilterChanged)).unwrap();
    tx.send(Trigger::Teardown).unwrap();
    tx.send(Trigger::Host(HostEventKind::SelectionChanged)).unwrap();

    bridge.run(rx).await;

    assert_eq!(host.fetches(), 2);
    assert_eq!(bridge.surface().scenes(), 3);
    assert!(!bridge.active_flag().is_active());
}

#[tokio::test]
async fn run_unsubscribes_when_flag_cleared_during_load() {
    let host = FakeHost::with(vec![Ok(sales_table(30.0, 60.0))]);
    let mut bridge = bridge(&host);
    let triggers = bridge.initialize().await;
    assert_eq!(host.registry.len(), HostEventKind::ALL.len());

    *host.deactivate_on_fetch.lock().unwrap() = Some(bridge.active_flag());
    host.registry.dispatch(HostEventKind::FilterChanged);

    // The registry still holds live senders, so `run` only returns by noticing
    // the cleared flag.
    tokio::time::timeout(std::time::Duration::from_secs(5), bridge.run(triggers))
        .await
        .expect("run returns after deactivation");

    assert_eq!(host.fetches(), 2);
    assert!(host.registry.is_empty());
}
