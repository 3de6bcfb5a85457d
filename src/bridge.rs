//! Drives the gauge pipeline from host notifications.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::columns::resolve_columns;
use crate::config::{GaugeConfig, GaugeSettings};
use crate::data::{DataTable, GaugeState};
use crate::domain::compute_domain;
use crate::error::GaugeError;
use crate::geometry::build_geometry;
use crate::host::{HostEventKind, HostRuntime, ListenerId, SettingsDialog, Trigger, TriggerReceiver};
use crate::render::{DrawingSurface, GaugeRenderer, Viewport};

/// Where the view is in its `Uninitialized → Loading → {Rendered, Error}` cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Uninitialized,
    Loading,
    Rendered,
    Error(GaugeError),
}

/// Shared "still active" flag. Cleared on teardown; a fetch resolving after
/// that must not touch state or the surface.
///
/// Clearing the flag does not unsubscribe from the host. [`DataBridge::run`]
/// disposes once it sees the flag cleared; outside `run`, call
/// [`DataBridge::dispose`].
#[derive(Debug, Clone)]
pub struct ActiveFlag(Arc<AtomicBool>);

impl ActiveFlag {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Returns whether the flag was still set.
    pub fn deactivate(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

pub struct DataBridge<H: ?Sized, S> {
    host: Arc<H>,
    surface: S,
    settings: GaugeSettings,
    renderer: GaugeRenderer,
    state: Option<GaugeState>,
    view: ViewState,
    viewport: Viewport,
    active: ActiveFlag,
    listeners: Vec<ListenerId>,
}

impl<H, S> DataBridge<H, S>
where
    H: HostRuntime + ?Sized,
    S: DrawingSurface,
{
    pub fn new(host: Arc<H>, surface: S, settings: GaugeSettings, viewport: Viewport) -> Self {
        let renderer = GaugeRenderer::new(settings.render.clone());
        Self {
            host,
            surface,
            settings,
            renderer,
            state: None,
            view: ViewState::Uninitialized,
            viewport,
            active: ActiveFlag::new(),
            listeners: Vec::new(),
        }
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn state(&self) -> Option<&GaugeState> {
        self.state.as_ref()
    }

    pub fn config(&self) -> &GaugeConfig {
        &self.settings.gauge
    }

    pub fn settings(&self) -> &GaugeSettings {
        &self.settings
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn active_flag(&self) -> ActiveFlag {
        self.active.clone()
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Subscribes to host notifications and runs the first load. The returned
    /// receiver yields the host's triggers; feed it to [`DataBridge::run`].
    pub async fn initialize(&mut self) -> TriggerReceiver {
        let (sender, receiver) = mpsc::unbounded_channel();
        for kind in HostEventKind::ALL {
            let id = self.host.add_event_listener(kind, sender.clone());
            self.listeners.push(id);
        }
        tracing::info!(listeners = self.listeners.len(), "gauge initialized");
        self.load().await;
        receiver
    }

    /// Processes triggers until teardown, deactivation or until the host drops
    /// every sender, then disposes.
    pub async fn run(&mut self, mut triggers: TriggerReceiver) {
        while let Some(trigger) = triggers.recv().await {
            if trigger == Trigger::Teardown || !self.active.is_active() {
                break;
            }
            self.handle(trigger).await;
            if !self.active.is_active() {
                tracing::debug!("deactivated while handling a trigger");
                break;
            }
        }
        self.dispose();
    }

    pub async fn handle(&mut self, trigger: Trigger) {
        match trigger {
            Trigger::Host(kind) => {
                tracing::debug!(?kind, "host notification");
                self.load().await;
            }
            Trigger::Resize(viewport) => self.resize(viewport),
            Trigger::Teardown => self.dispose(),
        }
    }

    /// Releases every host subscription. Safe to call more than once.
    pub fn dispose(&mut self) {
        let was_active = self.active.deactivate();
        for id in self.listeners.drain(..) {
            self.host.remove_event_listener(id);
        }
        if was_active {
            tracing::info!("gauge disposed");
        }
    }

    // ========================================================================
    // PIPELINE
    // ========================================================================

    /// Fetches the summary data and redraws, or shows why it cannot.
    pub async fn load(&mut self) {
        if !self.active.is_active() {
            return;
        }
        self.view = ViewState::Loading;
        let fetched = self.host.get_summary_data().await;
        if !self.active.is_active() {
            tracing::debug!("gauge torn down while fetching, dropping result");
            return;
        }
        let outcome = fetched
            .map_err(GaugeError::host_fetch)
            .and_then(|table| self.apply(table));
        match outcome {
            Ok(()) => self.redraw(),
            Err(err) => self.show_error(err),
        }
    }

    /// Re-renders from cached state for a new viewport; never fetches.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if !self.active.is_active() {
            return;
        }
        if self.view == ViewState::Rendered {
            self.redraw();
        } else if let ViewState::Error(err) = &self.view {
            let message = err.user_message();
            self.surface.show_message(&message);
        }
    }

    /// Opens the settings surface and reloads with whatever it returns.
    pub async fn configure<D>(&mut self, dialog: &D)
    where
        D: SettingsDialog + ?Sized,
    {
        let result = dialog.open(&self.settings).await;
        if !self.active.is_active() {
            return;
        }
        match result {
            Ok(Some(settings)) => {
                if let Err(err) = settings.validate() {
                    tracing::warn!(error = %err, "ignoring invalid settings");
                    return;
                }
                tracing::info!(policy = ?settings.domain.policy, "applying new settings");
                self.renderer = GaugeRenderer::new(settings.render.clone());
                self.settings = settings;
                self.load().await;
            }
            Ok(None) => tracing::debug!("settings dialog cancelled"),
            Err(err) => tracing::warn!(error = %format!("{err:#}"), "settings dialog failed"),
        }
    }

    fn apply(&mut self, table: DataTable) -> Result<(), GaugeError> {
        if table.is_empty() {
            return Err(GaugeError::NoDataAvailable);
        }
        let columns = resolve_columns(&table.columns)?;
        let state = GaugeState::from_table(&table, columns).ok_or(GaugeError::NoDataAvailable)?;
        let values = table.column_values(columns.value_index);
        let domain = compute_domain(
            self.settings.domain.policy,
            state.current_value,
            state.target_value,
            &values,
            self.settings.domain.fallback_target,
        );
        self.settings.gauge.apply_domain(domain);
        self.state = Some(state);
        tracing::debug!(
            rows = table.rows.len(),
            current = state.current_value,
            target = ?state.target_value,
            "applied summary data"
        );
        Ok(())
    }

    fn redraw(&mut self) {
        let Some(state) = self.state else {
            return;
        };
        let geometry = build_geometry(&self.settings.gauge, &state, self.settings.number_format);
        let scene = self.renderer.render(&geometry, self.viewport);
        self.surface.present(scene);
        self.view = ViewState::Rendered;
    }

    fn show_error(&mut self, err: GaugeError) {
        match &err {
            GaugeError::HostFetchFailed(cause) => tracing::warn!(%cause, "summary data fetch failed"),
            other => tracing::info!(reason = %other, "nothing to draw"),
        }
        self.surface.show_message(&err.user_message());
        self.view = ViewState::Error(err);
    }
}
