//! Widget scheduler: one registry entry and two timers per widget.
//!
//! ```text
//!                      start_monitoring
//!                            │
//!            ┌───────────────┼─────────────────┐
//!            ▼               ▼                 ▼
//!     immediate cycle   refresh task      progress task
//!       + stamp         every interval    every 100 ms
//!                       cycle + stamp     re-render stored pair
//! ```
//!
//! All per-widget state lives in a single map behind a `std::sync::Mutex`.
//! The lock is only held for short synchronous sections, never across a
//! fetch or a surface push. Each start or stop bumps the widget's generation;
//! a cycle that finishes after its widget was restarted, stopped, or removed
//! drops its result instead of rendering it.
//!
//! Timer tasks hold a `Weak` reference to the monitor, so dropping the last
//! [`DepartureMonitor`] handle ends them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::client::UpstreamClient;
use crate::config::{ColorConfig, MonitorConfig, WidgetSettings};
use crate::error::ConfigError;
use crate::messages::PluginMessage;
use crate::render::{DisplayPair, PlaceholderKind, RenderState};
use crate::renderer_dyn::AnyRenderer;
use crate::selector::{fetch_limit, select, SelectionResult};
use crate::traits::{Clock, ImageRenderer, Transport, WidgetSurface};

/// Host-assigned widget identifier.
pub type WidgetId = String;

/// Progress bar fill for `elapsed_ms` into an interval of `interval_secs`.
///
/// Clamped to 100.
///
/// ```rust
/// use rs_departures::monitor::progress_percent;
///
/// assert_eq!(progress_percent(15_000, 30.0), 50.0);
/// assert_eq!(progress_percent(45_000, 30.0), 100.0);
/// ```
pub fn progress_percent(elapsed_ms: u64, interval_secs: f64) -> f64 {
    let interval_ms = interval_secs * 1000.0;
    if interval_ms <= 0.0 {
        return 100.0;
    }
    (elapsed_ms as f64 / interval_ms * 100.0).min(100.0)
}

// ============================================================================
// Registry
// ============================================================================

#[derive(Debug, Default)]
struct WidgetRuntimeState {
    settings: WidgetSettings,
    display: Option<DisplayPair>,
    last_update_ms: Option<u64>,
    refresh_task: Option<JoinHandle<()>>,
    progress_task: Option<JoinHandle<()>>,
    visible: bool,
    generation: u64,
}

impl WidgetRuntimeState {
    fn abort_tasks(&mut self) {
        if let Some(task) = self.refresh_task.take() {
            task.abort();
        }
        if let Some(task) = self.progress_task.take() {
            task.abort();
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.visible && self.generation == generation
    }

    fn timers(&self) -> TimerStatus {
        let live = |task: &Option<JoinHandle<()>>| task.as_ref().is_some_and(|t| !t.is_finished());
        TimerStatus {
            refresh: live(&self.refresh_task),
            progress: live(&self.progress_task),
        }
    }
}

/// Which timers a widget currently runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerStatus {
    /// Refresh timer is live.
    pub refresh: bool,
    /// Progress timer is live.
    pub progress: bool,
}

/// Summary of one widget for hosts and diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetStatus {
    /// Widget id.
    pub id: WidgetId,
    /// Whether the widget is being monitored.
    pub visible: bool,
    /// Live timers.
    pub timers: TimerStatus,
    /// Clock time of the last completed refresh.
    pub last_update_ms: Option<u64>,
    /// Line code currently shown, if a departure is on screen.
    pub showing_line: Option<String>,
}

// ============================================================================
// Monitor
// ============================================================================

struct MonitorInner<T, S, C> {
    client: UpstreamClient<T, C>,
    surface: S,
    renderer: AnyRenderer,
    config: MonitorConfig,
    widgets: Mutex<HashMap<WidgetId, WidgetRuntimeState>>,
}

impl<T, S, C> Drop for MonitorInner<T, S, C> {
    fn drop(&mut self) {
        let widgets = self.widgets.get_mut().unwrap_or_else(PoisonError::into_inner);
        for state in widgets.values_mut() {
            state.abort_tasks();
        }
    }
}

/// Drives every widget: settings, timers, fetches and pushes.
///
/// Cheap to clone; clones share the same registry.
///
/// # Example
///
/// ```rust
/// use rs_departures::hal::{MockClock, MockSurface, MockTransport};
/// use rs_departures::{DepartureMonitor, MonitorConfig, UpstreamClient, UpstreamConfig, WidgetSettings};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let transport = MockTransport::new();
/// transport.respond_json(r#"{"data":{"monitors":[{"lines":[]}]}}"#);
/// let surface = MockSurface::new();
///
/// let client = UpstreamClient::new(transport, MockClock::new(), &UpstreamConfig::default()).unwrap();
/// let monitor = DepartureMonitor::new(client, surface.clone(), MonitorConfig::default());
///
/// monitor.start_monitoring("key-1", WidgetSettings::for_stop("4111")).await;
/// assert!(surface.last_svg("key-1").unwrap().contains(">Departures</text>"));
///
/// monitor.shutdown();
/// # });
/// ```
pub struct DepartureMonitor<T, S, C> {
    inner: Arc<MonitorInner<T, S, C>>,
}

impl<T, S, C> Clone for DepartureMonitor<T, S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, S, C> DepartureMonitor<T, S, C>
where
    T: Transport + 'static,
    S: WidgetSurface + 'static,
    C: Clock + 'static,
{
    /// Creates a monitor that renders SVG.
    pub fn new(client: UpstreamClient<T, C>, surface: S, config: MonitorConfig) -> Self {
        Self::with_renderer(client, surface, config, AnyRenderer::default())
    }

    /// Creates a monitor with a specific renderer.
    pub fn with_renderer(
        client: UpstreamClient<T, C>,
        surface: S,
        config: MonitorConfig,
        renderer: AnyRenderer,
    ) -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                client,
                surface,
                renderer,
                config,
                widgets: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The shared upstream client.
    pub fn client(&self) -> &UpstreamClient<T, C> {
        &self.inner.client
    }

    /// The surface images are pushed to.
    pub fn surface(&self) -> &S {
        &self.inner.surface
    }

    /// Starts (or restarts) monitoring a widget.
    ///
    /// Called when a widget appears and whenever its settings change. Any
    /// running timers for the widget are cancelled first.
    pub async fn start_monitoring(&self, id: &str, settings: WidgetSettings) {
        let generation = {
            let mut widgets = self.inner.lock();
            let state = widgets.entry(id.to_string()).or_default();
            state.abort_tasks();
            state.settings = settings.clone();
            state.visible = true;
            state.generation += 1;
            state.last_update_ms = None;
            state.generation
        };
        let colors = settings.colors();

        let stop_id = match settings.stop_id() {
            Ok(stop_id) => stop_id,
            Err(ConfigError::MissingStopId) => {
                warn!(widget = %id, "no stop id configured");
                self.inner
                    .push(id, &PlaceholderKind::NoStationConfigured.into(), &colors)
                    .await;
                return;
            }
            Err(e) => {
                error!(widget = %id, error = %e, "cannot start monitoring");
                self.inner
                    .push(id, &PlaceholderKind::InvalidStopId.into(), &colors)
                    .await;
                return;
            }
        };

        let interval_secs = settings.refresh_interval_secs(&self.inner.config);
        info!(widget = %id, stop = stop_id, interval_secs, "starting monitoring");

        self.inner.run_cycle(id, stop_id, generation).await;

        let mut widgets = self.inner.lock();
        let Some(state) = widgets.get_mut(id) else {
            return;
        };
        if !state.is_current(generation) {
            debug!(widget = %id, "superseded before timers started");
            return;
        }
        state.last_update_ms = Some(self.inner.client.clock().now_ms());

        let weak = Arc::downgrade(&self.inner);
        state.refresh_task = Some(spawn_refresh(
            weak.clone(),
            id.to_string(),
            stop_id,
            generation,
            settings.refresh_interval(&self.inner.config),
        ));
        if settings.show_progress_bar() {
            state.progress_task = Some(spawn_progress(
                weak,
                id.to_string(),
                self.inner.config.progress_tick(),
            ));
        }
    }

    /// Stops a widget's timers and forgets what it showed.
    ///
    /// Settings are kept so the host can restart it later.
    pub fn stop_monitoring(&self, id: &str) {
        let mut widgets = self.inner.lock();
        if let Some(state) = widgets.get_mut(id) {
            state.abort_tasks();
            state.last_update_ms = None;
            state.display = None;
            state.visible = false;
            state.generation += 1;
            info!(widget = %id, "stopped monitoring");
        }
    }

    /// Bypasses the cache and refreshes a widget now.
    ///
    /// Uses the widget's stored settings. Does nothing (besides a warning)
    /// without a valid stop id. The progress timer keeps running.
    pub async fn manual_refresh(&self, id: &str) {
        let current = {
            let widgets = self.inner.lock();
            widgets
                .get(id)
                .map(|state| (state.settings.stop_id(), state.generation))
        };

        let (stop_id, generation) = match current {
            Some((Ok(stop_id), generation)) => (stop_id, generation),
            Some((Err(e), _)) => {
                warn!(widget = %id, error = %e, "cannot refresh");
                return;
            }
            None => {
                warn!(widget = %id, "cannot refresh unknown widget");
                return;
            }
        };

        info!(widget = %id, stop = stop_id, "manual refresh");
        self.inner.client.clear_cache(Some(stop_id));
        self.inner.run_cycle(id, stop_id, generation).await;
        self.inner.stamp(id, generation);
    }

    /// Handles a JSON message from the host's settings panel.
    pub async fn handle_plugin_message(&self, id: &str, payload: &serde_json::Value) {
        match PluginMessage::from_value(payload) {
            PluginMessage::RefreshNow => self.manual_refresh(id).await,
            PluginMessage::Unknown => debug!(widget = %id, %payload, "ignoring message"),
        }
    }

    /// Runs one fetch/select/render cycle with the stored settings.
    ///
    /// Does not touch the last-update stamp or the timers.
    pub async fn refresh_cycle(&self, id: &str) {
        let current = {
            let widgets = self.inner.lock();
            widgets
                .get(id)
                .and_then(|state| Some((state.settings.stop_id().ok()?, state.generation)))
        };
        if let Some((stop_id, generation)) = current {
            self.inner.run_cycle(id, stop_id, generation).await;
        }
    }

    /// Re-renders the stored departures with the current progress.
    pub async fn progress_tick(&self, id: &str) {
        self.inner.progress_tick(id).await;
    }

    /// Live timers for a widget, `None` if unknown.
    pub fn timer_status(&self, id: &str) -> Option<TimerStatus> {
        self.inner.lock().get(id).map(WidgetRuntimeState::timers)
    }

    /// Status summary for a widget, `None` if unknown.
    pub fn widget_status(&self, id: &str) -> Option<WidgetStatus> {
        self.inner.lock().get(id).map(|state| WidgetStatus {
            id: id.to_string(),
            visible: state.visible,
            timers: state.timers(),
            last_update_ms: state.last_update_ms,
            showing_line: state.display.as_ref().map(|pair| pair.first.line.clone()),
        })
    }

    /// Known widget ids, sorted.
    pub fn widget_ids(&self) -> Vec<WidgetId> {
        let mut ids: Vec<WidgetId> = self.inner.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Stored settings for a widget.
    pub fn settings(&self, id: &str) -> Option<WidgetSettings> {
        self.inner.lock().get(id).map(|state| state.settings.clone())
    }

    /// Stops every widget.
    pub fn shutdown(&self) {
        for id in self.widget_ids() {
            self.stop_monitoring(&id);
        }
        info!("monitor shut down");
    }
}

impl<T, S, C> MonitorInner<T, S, C>
where
    T: Transport,
    S: WidgetSurface,
    C: Clock,
{
    fn lock(&self) -> MutexGuard<'_, HashMap<WidgetId, WidgetRuntimeState>> {
        self.widgets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stamp(&self, id: &str, generation: u64) {
        let now = self.client.clock().now_ms();
        if let Some(state) = self.lock().get_mut(id) {
            if state.is_current(generation) {
                state.last_update_ms = Some(now);
            }
        }
    }

    async fn run_cycle(&self, id: &str, stop_id: i64, generation: u64) {
        let selection = {
            let widgets = self.lock();
            match widgets.get(id) {
                Some(state) if state.is_current(generation) => state.settings.selection_config(),
                _ => return,
            }
        };

        debug!(widget = %id, stop = stop_id, "refreshing");
        let outcome = self
            .client
            .fetch_departures(stop_id, fetch_limit(selection.show_two_departures))
            .await;

        let (render_state, colors) = {
            let mut widgets = self.lock();
            let Some(state) = widgets.get_mut(id) else {
                return;
            };
            if !state.is_current(generation) {
                debug!(widget = %id, stop = stop_id, "discarding stale result");
                return;
            }

            let render_state = match outcome {
                Err(e) => {
                    error!(widget = %id, stop = stop_id, error = %e, "refresh failed");
                    RenderState::Placeholder(PlaceholderKind::FetchError)
                }
                Ok(departures) => match select(&departures, &selection) {
                    SelectionResult::Empty => {
                        info!(widget = %id, stop = stop_id, "no departures");
                        state.display = None;
                        RenderState::Placeholder(PlaceholderKind::NoDeparturesSoon)
                    }
                    SelectionResult::NoLineMatch => {
                        info!(widget = %id, stop = stop_id, "no departures for filtered lines");
                        state.display = None;
                        RenderState::Placeholder(PlaceholderKind::NoLineMatch)
                    }
                    SelectionResult::Selected { first, second } => {
                        debug!(
                            widget = %id,
                            line = %first.line,
                            countdown = first.countdown,
                            second = ?second.as_ref().map(|d| d.countdown),
                            "departure selected"
                        );
                        let pair = DisplayPair { first, second };
                        let progress = state.settings.show_progress_bar().then_some(0.0);
                        let render_state = pair.to_state(progress);
                        state.display = Some(pair);
                        render_state
                    }
                },
            };
            (render_state, state.settings.colors())
        };

        self.push(id, &render_state, &colors).await;
    }

    async fn progress_tick(&self, id: &str) {
        let frame = {
            let widgets = self.lock();
            let Some(state) = widgets.get(id) else {
                return;
            };
            match (&state.display, state.last_update_ms) {
                (Some(pair), Some(last_update)) if state.visible && state.settings.show_progress_bar() => {
                    let elapsed = self.client.clock().elapsed_since(last_update);
                    let percent =
                        progress_percent(elapsed, state.settings.refresh_interval_secs(&self.config));
                    Some((pair.to_state(Some(percent)), state.settings.colors()))
                }
                _ => None,
            }
        };

        if let Some((render_state, colors)) = frame {
            self.push(id, &render_state, &colors).await;
        }
    }

    async fn push(&self, id: &str, state: &RenderState, colors: &ColorConfig) {
        let image = self.renderer.render(state, colors);
        if let Err(e) = self.surface.set_image(id, &image).await {
            warn!(widget = %id, error = %e, "failed to push image");
        }
        if let Err(e) = self.surface.set_title(id, "").await {
            warn!(widget = %id, error = %e, "failed to clear title");
        }
    }
}

// ============================================================================
// Timer tasks
// ============================================================================

fn spawn_refresh<T, S, C>(
    monitor: Weak<MonitorInner<T, S, C>>,
    id: WidgetId,
    stop_id: i64,
    generation: u64,
    period: Duration,
) -> JoinHandle<()>
where
    T: Transport + 'static,
    S: WidgetSurface + 'static,
    C: Clock + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let Some(inner) = monitor.upgrade() else {
                break;
            };
            inner.run_cycle(&id, stop_id, generation).await;
            inner.stamp(&id, generation);
        }
    })
}

fn spawn_progress<T, S, C>(
    monitor: Weak<MonitorInner<T, S, C>>,
    id: WidgetId,
    tick: Duration,
) -> JoinHandle<()>
where
    T: Transport + 'static,
    S: WidgetSurface + 'static,
    C: Clock + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + tick, tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let Some(inner) = monitor.upgrade() else {
                break;
            };
            inner.progress_tick(&id).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpstreamConfig;
    use crate::hal::{MockClock, MockSurface, MockTransport};

    #[test]
    fn progress_math() {
        assert_eq!(progress_percent(0, 30.0), 0.0);
        assert_eq!(progress_percent(15_000, 30.0), 50.0);
        assert_eq!(progress_percent(30_000, 30.0), 100.0);
        assert_eq!(progress_percent(45_000, 30.0), 100.0);
        assert_eq!(progress_percent(5_000, 0.0), 100.0);
    }

    fn monitor() -> (
        DepartureMonitor<MockTransport, MockSurface, MockClock>,
        MockTransport,
        MockSurface,
    ) {
        let transport = MockTransport::new();
        let surface = MockSurface::new();
        let client =
            UpstreamClient::new(transport.clone(), MockClock::new(), &UpstreamConfig::default())
                .unwrap();
        let monitor = DepartureMonitor::new(client, surface.clone(), MonitorConfig::default());
        (monitor, transport, surface)
    }

    #[tokio::test]
    async fn missing_stop_renders_placeholder_without_timers() {
        let (monitor, transport, surface) = monitor();

        monitor.start_monitoring("w", WidgetSettings::default()).await;

        assert!(surface.last_svg("w").unwrap().contains(">No Station</text>"));
        assert_eq!(surface.titles("w"), vec![String::new()]);
        assert_eq!(monitor.timer_status("w"), Some(TimerStatus::default()));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn invalid_stop_renders_placeholder() {
        let (monitor, transport, surface) = monitor();

        monitor.start_monitoring("w", WidgetSettings::for_stop("   ")).await;

        assert!(surface.last_svg("w").unwrap().contains(">Invalid</text>"));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn stop_with_trailing_text_is_monitored() {
        let (monitor, transport, _) = monitor();
        transport.respond_json(r#"{"data":{"monitors":[{"lines":[]}]}}"#);

        monitor.start_monitoring("w", WidgetSettings::for_stop("4111 abc")).await;

        assert_eq!(
            transport.requests(),
            vec!["https://www.wienerlinien.at/ogd_realtime/monitor?rbl=4111"]
        );
        monitor.shutdown();
    }

    #[tokio::test]
    async fn stop_keeps_settings() {
        let (monitor, transport, _) = monitor();
        transport.respond_json(r#"{"data":{"monitors":[{"lines":[]}]}}"#);

        let settings = WidgetSettings::for_stop("1").with_line_filter("U1");
        monitor.start_monitoring("w", settings.clone()).await;
        assert_eq!(
            monitor.timer_status("w"),
            Some(TimerStatus {
                refresh: true,
                progress: true,
            })
        );

        monitor.stop_monitoring("w");
        let status = monitor.widget_status("w").unwrap();
        assert!(!status.visible);
        assert_eq!(status.last_update_ms, None);
        assert_eq!(monitor.settings("w"), Some(settings));
        assert_eq!(monitor.widget_ids(), vec!["w".to_string()]);
    }

    #[tokio::test]
    async fn unknown_message_is_ignored() {
        let (monitor, transport, surface) = monitor();
        transport.respond_json(r#"{"data":{"monitors":[{"lines":[]}]}}"#);
        monitor.start_monitoring("w", WidgetSettings::for_stop("1")).await;
        surface.clear();

        monitor
            .handle_plugin_message("w", &serde_json::json!({"event": "somethingElse"}))
            .await;

        assert_eq!(surface.image_count("w"), 0);
        assert_eq!(transport.request_count(), 1);
        monitor.shutdown();
    }
}
