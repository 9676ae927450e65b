//! Destination dialog controller
//!
//! Derives the dialog's [`UiState`] from registry signals and the loading
//! gate, and drives destination activation: direct selection, provisional
//! resolution, or single-flight local configuration.

use std::sync::{Arc, Weak};

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::services::{DialogContext, LoadingTimerGate};
use crate::types::{
    has_real_destination, show_manage_printers_button, ActivationOutcome, Destination,
    DestinationReadiness, DialogConfig, DialogSignal, DialogSnapshot, PrintServerEvent,
    PrintServersConfig, PrinterSetupResponse, RegistryEvent, UiState, UiStateInputs,
};

struct DialogState {
    connected: bool,
    open: bool,
    session_id: Uuid,
    /// Non-virtual destinations from the last registry snapshot
    destinations: Vec<Destination>,
    search_in_progress: bool,
    server_printers_loading: bool,
    print_servers: PrintServersConfig,
    search_query: Option<String>,
    /// Single-flight slot for local configuration
    destination_in_configuring: Option<Destination>,
}

impl DialogState {
    fn new() -> Self {
        Self {
            connected: false,
            open: false,
            session_id: Uuid::new_v4(),
            destinations: Vec::new(),
            search_in_progress: false,
            server_printers_loading: false,
            print_servers: PrintServersConfig::default(),
            search_query: None,
            destination_in_configuring: None,
        }
    }

    fn loading_any(&self) -> bool {
        self.search_in_progress || self.server_printers_loading
    }

    /// Rendered list: search filter applied
    fn visible_destinations(&self) -> Vec<Destination> {
        match self.search_query.as_deref() {
            Some(query) => self
                .destinations
                .iter()
                .filter(|d| d.matches_query(query))
                .cloned()
                .collect(),
            None => self.destinations.clone(),
        }
    }

    fn is_visible(&self, destination_key: &str) -> bool {
        self.destinations.iter().any(|d| {
            d.key == destination_key
                && self
                    .search_query
                    .as_deref()
                    .is_none_or(|query| d.matches_query(query))
        })
    }
}

/// Destination dialog controller
///
/// Collaborators are injected through [`DialogContext`]. The rendering layer
/// subscribes to [`DestinationDialogController::watch_snapshot`] and
/// [`DestinationDialogController::subscribe_signals`].
pub struct DestinationDialogController {
    ctx: Arc<DialogContext>,
    config: DialogConfig,
    gate: LoadingTimerGate,
    state: Mutex<DialogState>,
    /// Held from reading the inputs to publishing, so snapshots land in call order
    refresh: Mutex<()>,
    snapshot_tx: watch::Sender<DialogSnapshot>,
    signal_tx: broadcast::Sender<DialogSignal>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl DestinationDialogController {
    /// 创建对话框控制器
    #[must_use]
    pub fn new(ctx: Arc<DialogContext>, config: DialogConfig) -> Self {
        let (snapshot_tx, _) = watch::channel(DialogSnapshot::default());
        let (signal_tx, _) = broadcast::channel(config.event_buffer_size.max(1));
        Self {
            ctx,
            gate: LoadingTimerGate::new(config.min_loading_time()),
            config,
            state: Mutex::new(DialogState::new()),
            refresh: Mutex::new(()),
            snapshot_tx,
            signal_tx,
            listener: Mutex::new(None),
        }
    }

    // ===== Observation =====

    pub fn watch_snapshot(&self) -> watch::Receiver<DialogSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn subscribe_signals(&self) -> broadcast::Receiver<DialogSignal> {
        self.signal_tx.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> DialogSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    #[must_use]
    pub fn ui_state(&self) -> UiState {
        self.snapshot_tx.borrow().ui_state
    }

    #[must_use]
    pub fn config(&self) -> &DialogConfig {
        &self.config
    }

    pub async fn is_open(&self) -> bool {
        self.state.lock().await.open
    }

    pub async fn is_connected(&self) -> bool {
        self.state.lock().await.connected
    }

    pub async fn min_loading_time_elapsed(&self) -> bool {
        self.gate.is_elapsed().await
    }

    pub async fn destination_in_configuring(&self) -> Option<Destination> {
        self.state.lock().await.destination_in_configuring.clone()
    }

    // ===== Lifecycle =====

    /// Subscribe to both registries and start pumping their events.
    ///
    /// Subscriptions survive close/show cycles and end on [`Self::disconnect`].
    pub async fn connect(self: &Arc<Self>) -> CoreResult<()> {
        let mut listener = self.listener.lock().await;
        if listener.is_some() {
            log::warn!("Destination dialog already connected");
            return Ok(());
        }

        let registry_rx = self.ctx.destination_registry().subscribe();
        let server_rx = self.ctx.print_server_registry().subscribe();

        let print_servers = match self.ctx.print_server_registry().config().await {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load print server config: {e}");
                PrintServersConfig::default()
            }
        };

        {
            let mut state = self.state.lock().await;
            debug_assert!(
                state.destinations.is_empty(),
                "destination list populated before registry was wired"
            );
            if !state.destinations.is_empty() {
                log::error!("Destination list populated before connect, discarding");
                state.destinations.clear();
            }
            state.print_servers = print_servers;
            state.connected = true;
        }

        *listener = Some(tokio::spawn(Self::run_event_loop(
            Arc::downgrade(self),
            registry_rx,
            server_rx,
        )));
        log::info!("Destination dialog connected");
        Ok(())
    }

    /// Tear down registry subscriptions and close the dialog.
    pub async fn disconnect(&self) {
        if let Some(handle) = self.listener.lock().await.take() {
            handle.abort();
        }
        self.gate.cancel().await;
        {
            let mut state = self.state.lock().await;
            state.connected = false;
            state.open = false;
            state.search_query = None;
            state.destinations.clear();
        }
        log::info!("Destination dialog disconnected");
    }

    /// Open the dialog.
    ///
    /// Renders the registry's current snapshot right away and starts the
    /// loading gate unless it already elapsed in this session.
    pub async fn show(self: &Arc<Self>) -> CoreResult<()> {
        let session_id = {
            let mut state = self.state.lock().await;
            if !state.connected {
                return Err(CoreError::DialogNotConnected);
            }
            state.open = true;
            state.session_id
        };

        self.refresh_ui_state().await;

        let weak = Arc::downgrade(self);
        let scheduled = self
            .gate
            .start(move || async move {
                if let Some(this) = weak.upgrade() {
                    this.refresh_ui_state().await;
                }
            })
            .await;
        log::info!("[session {session_id}] Destination dialog shown (loading timer started: {scheduled})");
        Ok(())
    }

    /// Close or cancel the dialog.
    ///
    /// Cancels a pending loading timer and clears the search filter. An
    /// in-flight configuration keeps running; its result is dropped.
    pub async fn close(&self) {
        let was_open = {
            let mut state = self.state.lock().await;
            let was_open = state.open;
            state.open = false;
            state.search_query = None;
            was_open
        };
        self.gate.cancel().await;
        self.republish().await;
        if was_open {
            self.emit(DialogSignal::Closed);
            log::debug!("Destination dialog closed");
        }
    }

    /// Begin a new discovery session; the loading gate must elapse again.
    pub async fn start_new_session(&self) {
        self.gate.reset().await;
        let session_id = {
            let mut state = self.state.lock().await;
            state.session_id = Uuid::new_v4();
            state.session_id
        };
        self.republish().await;
        log::info!("[session {session_id}] New discovery session");
    }

    // ===== User input =====

    /// Filter the rendered list. Empty input clears the filter.
    pub async fn set_search_query(&self, query: Option<String>) {
        let query = query
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());
        self.state.lock().await.search_query = query;
        self.republish().await;
    }

    /// Ask the print server registry to fetch printers from `server_name`.
    pub async fn choose_print_server(&self, server_name: &str) -> CoreResult<()> {
        log::info!("Choosing print server: {server_name}");
        self.ctx
            .print_server_registry()
            .choose_print_server(server_name)
            .await
    }

    /// Returns whether the request was forwarded (button visible).
    pub fn request_manage_printers(&self) -> bool {
        if !self.snapshot_tx.borrow().show_manage_printers_button {
            return false;
        }
        self.emit(DialogSignal::ManagePrintersRequested);
        true
    }

    /// Activate a destination picked from the rendered list.
    pub async fn activate(&self, destination: &Destination) -> ActivationOutcome {
        if !self.is_open().await {
            log::debug!("Ignoring activation of {}: dialog closed", destination.id);
            return ActivationOutcome::Discarded;
        }

        match destination.readiness {
            DestinationReadiness::Ready => self.select_and_close(destination.clone()).await,
            DestinationReadiness::Provisional => self.activate_provisional(destination).await,
            DestinationReadiness::NeedsConfiguration => {
                self.configure_and_select(destination).await
            }
        }
    }

    // ===== Activation flows =====

    async fn select_and_close(&self, destination: Destination) -> ActivationOutcome {
        log::info!("Destination selected: {}", destination.id);
        self.ctx.destination_registry().select(&destination).await;
        self.emit(DialogSignal::DestinationSelected(destination));
        self.close().await;
        ActivationOutcome::Selected
    }

    async fn activate_provisional(&self, destination: &Destination) -> ActivationOutcome {
        let result = self.ctx.provisional_resolver().resolve(destination).await;

        let (open, visible) = {
            let state = self.state.lock().await;
            (state.open, state.is_visible(&destination.key))
        };
        if open && visible {
            self.emit(DialogSignal::RestoreFocus {
                destination_key: destination.key.clone(),
            });
        }

        match result {
            Ok(resolved) if open => self.select_and_close(resolved).await,
            Ok(resolved) => {
                log::debug!(
                    "Provisional destination {} resolved after close, not selecting",
                    resolved.id
                );
                ActivationOutcome::Discarded
            }
            Err(e) => {
                log::warn!(
                    "Failed to resolve provisional destination: {} ({e})",
                    destination.id
                );
                if open {
                    self.emit(DialogSignal::ShowErrorToast {
                        message: e.to_string(),
                    });
                }
                ActivationOutcome::ProvisionalFailed
            }
        }
    }

    async fn configure_and_select(&self, destination: &Destination) -> ActivationOutcome {
        {
            let mut state = self.state.lock().await;
            if let Some(current) = &state.destination_in_configuring {
                log::debug!(
                    "Ignoring activation of {}: {} is being configured",
                    destination.id,
                    current.id
                );
                return ActivationOutcome::Ignored;
            }
            state.destination_in_configuring = Some(destination.clone());
        }

        self.emit(DialogSignal::ConfigurationStarted {
            destination_key: destination.key.clone(),
        });
        log::info!("Configuring destination: {}", destination.id);

        let result = self
            .ctx
            .destination_registry()
            .resolve_local(destination)
            .await;

        let open = {
            let mut state = self.state.lock().await;
            state.destination_in_configuring = None;
            state.open
        };

        match result {
            Ok(response) => {
                let configured = self.apply_setup_response(destination, response);
                self.ctx
                    .destination_registry()
                    .update_destination(&configured)
                    .await;
                self.refresh_ui_state().await;
                if !open {
                    log::debug!(
                        "Configuration of {} finished after close, not selecting",
                        configured.id
                    );
                    return ActivationOutcome::Discarded;
                }
                self.emit(DialogSignal::ConfigurationSucceeded {
                    destination_key: configured.key.clone(),
                });
                let destination_id = configured.id.clone();
                let outcome = self.select_and_close(configured).await;
                self.spawn_eula_fetch(destination_id);
                outcome
            }
            Err(e) => {
                if e.is_expected() {
                    log::warn!("Failed to configure destination {}: {e}", destination.id);
                } else {
                    log::error!("Failed to configure destination {}: {e}", destination.id);
                }
                if open {
                    self.emit(DialogSignal::ConfigurationFailed {
                        destination_key: destination.key.clone(),
                    });
                }
                ActivationOutcome::ConfigurationFailed
            }
        }
    }

    fn apply_setup_response(
        &self,
        destination: &Destination,
        response: PrinterSetupResponse,
    ) -> Destination {
        let mut capabilities = response.capabilities;
        if self.config.managed_print_options_enabled {
            if let Some(managed) = &response.managed_print_options {
                capabilities.apply_managed_print_options(managed);
            }
        }
        let mut configured = destination.clone();
        configured.attach_capabilities(capabilities);
        configured
    }

    /// Best-effort EULA lookup; failures are only logged.
    fn spawn_eula_fetch(&self, destination_id: String) {
        let registry = Arc::clone(self.ctx.destination_registry());
        let signal_tx = self.signal_tx.clone();
        tokio::spawn(async move {
            match registry.fetch_eula_url(&destination_id).await {
                Ok(url) if !url.is_empty() => {
                    let _ = signal_tx.send(DialogSignal::EulaUrlResolved {
                        destination_id,
                        url,
                    });
                }
                Ok(_) => log::debug!("No EULA for destination {destination_id}"),
                Err(e) => log::debug!("EULA fetch failed for {destination_id}: {e}"),
            }
        });
    }

    // ===== State derivation =====

    /// Re-read the registry snapshot and rederive the UI state.
    async fn refresh_ui_state(&self) {
        let _refresh = self.refresh.lock().await;
        let registry = self.ctx.destination_registry();
        let destinations = registry.destinations().await;
        let search_in_progress = registry.is_search_in_progress().await;
        let elapsed = self.gate.is_elapsed().await;

        let mut state = self.state.lock().await;
        if !state.connected {
            return;
        }
        state.destinations = destinations
            .into_iter()
            .filter(|d| !d.is_virtual())
            .collect();
        state.search_in_progress = search_in_progress;
        self.publish(&state, elapsed);
    }

    async fn republish(&self) {
        let _refresh = self.refresh.lock().await;
        let elapsed = self.gate.is_elapsed().await;
        let state = self.state.lock().await;
        self.publish(&state, elapsed);
    }

    fn publish(&self, state: &DialogState, min_loading_time_elapsed: bool) {
        let ui_state = UiStateInputs {
            min_loading_time_elapsed,
            has_real_destination: has_real_destination(&state.destinations),
            loading_any: state.loading_any(),
        }
        .derive();
        self.publish_with(state, ui_state);
    }

    fn publish_with(&self, state: &DialogState, ui_state: UiState) {
        let snapshot = DialogSnapshot {
            ui_state,
            show_manage_printers_button: show_manage_printers_button(
                self.config.manage_printers_available,
                ui_state,
            ),
            destinations: state.visible_destinations(),
            loading_any: state.loading_any(),
            search_query: state.search_query.clone(),
            print_servers: state.print_servers.clone(),
        };
        let session_id = state.session_id;
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            if current.ui_state != snapshot.ui_state {
                log::debug!(
                    "[session {session_id}] UI state {:?} -> {:?}",
                    current.ui_state,
                    snapshot.ui_state
                );
            }
            *current = snapshot;
            true
        });
    }

    fn emit(&self, signal: DialogSignal) {
        // No subscribers is fine: nobody is rendering
        let _ = self.signal_tx.send(signal);
    }

    // ===== Registry events =====

    async fn run_event_loop(
        weak: Weak<Self>,
        mut registry_rx: broadcast::Receiver<RegistryEvent>,
        mut server_rx: broadcast::Receiver<PrintServerEvent>,
    ) {
        let mut registry_closed = false;
        let mut servers_closed = false;

        while !(registry_closed && servers_closed) {
            tokio::select! {
                event = registry_rx.recv(), if !registry_closed => match event {
                    Ok(event) => {
                        let Some(this) = weak.upgrade() else { break };
                        this.handle_registry_event(event).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!("Destination registry events lagged, {skipped} skipped");
                        let Some(this) = weak.upgrade() else { break };
                        this.refresh_ui_state().await;
                    }
                    Err(RecvError::Closed) => {
                        log::debug!("Destination registry event stream closed");
                        registry_closed = true;
                    }
                },
                event = server_rx.recv(), if !servers_closed => match event {
                    Ok(event) => {
                        let Some(this) = weak.upgrade() else { break };
                        this.handle_print_server_event(event).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!("Print server events lagged, {skipped} skipped");
                        let Some(this) = weak.upgrade() else { break };
                        this.resync_print_servers().await;
                    }
                    Err(RecvError::Closed) => {
                        log::debug!("Print server event stream closed");
                        servers_closed = true;
                    }
                },
            }
        }
    }

    async fn handle_registry_event(&self, event: RegistryEvent) {
        match event {
            RegistryEvent::DestinationsInserted | RegistryEvent::SearchDone => {
                self.refresh_ui_state().await;
            }
            RegistryEvent::PrinterStatusUpdated {
                destination_key,
                status,
            } => {
                let visible = {
                    let _refresh = self.refresh.lock().await;
                    let mut state = self.state.lock().await;
                    if let Some(d) = state
                        .destinations
                        .iter_mut()
                        .find(|d| d.key == destination_key)
                    {
                        d.status = Some(status.clone());
                    }
                    let visible = state.is_visible(&destination_key);
                    // Row refresh only, the UI state stays as it is
                    let ui_state = self.snapshot_tx.borrow().ui_state;
                    self.publish_with(&state, ui_state);
                    visible
                };
                if visible {
                    self.emit(DialogSignal::PrinterStatusUpdated {
                        destination_key,
                        status,
                    });
                }
            }
        }
    }

    /// Recover from dropped print server events.
    ///
    /// The loading flag cannot be queried, so it is cleared; a server still
    /// fetching reports `true` again with its next event.
    async fn resync_print_servers(&self) {
        let config = self.ctx.print_server_registry().config().await;
        {
            let mut state = self.state.lock().await;
            state.server_printers_loading = false;
            match config {
                Ok(config) => state.print_servers = config,
                Err(e) => log::warn!("Failed to reload print server config: {e}"),
            }
        }
        self.republish().await;
    }

    async fn handle_print_server_event(&self, event: PrintServerEvent) {
        {
            let mut state = self.state.lock().await;
            match event {
                PrintServerEvent::ServersChanged(config) => {
                    log::debug!(
                        "Print servers changed: {} server(s), single mode: {}",
                        config.server_names.len(),
                        config.is_single_server_mode
                    );
                    state.print_servers = config;
                }
                PrintServerEvent::ServerPrintersLoading(loading) => {
                    state.server_printers_loading = loading;
                }
            }
        }
        self.republish().await;
    }
}

impl Drop for DestinationDialogController {
    fn drop(&mut self) {
        if let Some(handle) = self.listener.get_mut().take() {
            handle.abort();
        }
    }
}
