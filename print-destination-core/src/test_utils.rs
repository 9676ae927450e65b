//! 测试辅助模块
//!
//! 提供 mock 实现和便捷的测试工厂方法。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, Notify, RwLock};

use crate::error::{CoreError, CoreResult};
use crate::services::{DestinationDialogController, DialogContext};
use crate::traits::{DestinationRegistry, PrintServerRegistry};
use crate::types::{
    Destination, DestinationOrigin, DestinationReadiness, DialogConfig, PrintServerEvent,
    PrintServersConfig, PrinterSetupResponse, PrinterStatus, RegistryEvent,
};

// ===== Destination factories =====

pub fn ready_printer(id: &str) -> Destination {
    Destination::new(id, id, DestinationOrigin::Local, DestinationReadiness::Ready)
}

pub fn cros_printer(id: &str) -> Destination {
    Destination::new(
        id,
        id,
        DestinationOrigin::Cros,
        DestinationReadiness::NeedsConfiguration,
    )
}

pub fn provisional_printer(id: &str) -> Destination {
    Destination::new(
        id,
        format!("USB printer {id}"),
        DestinationOrigin::Extension,
        DestinationReadiness::Provisional,
    )
}

// ===== MockDestinationRegistry =====

pub struct MockDestinationRegistry {
    destinations: RwLock<Vec<Destination>>,
    search_in_progress: RwLock<bool>,
    events: broadcast::Sender<RegistryEvent>,
    setup_response: RwLock<PrinterSetupResponse>,
    /// 如果 Some，resolve_local 时返回此错误
    local_error: RwLock<Option<String>>,
    /// None 表示握手失败
    provisional_result: RwLock<Option<Destination>>,
    eula_url: RwLock<Option<String>>,
    /// 下一次 destinations() 读取快照后等待的时间
    snapshot_delay: RwLock<Option<Duration>>,
    /// 为 true 时 resolve_* 会等待 release_resolution()
    hold: RwLock<bool>,
    release: Notify,
    local_calls: RwLock<Vec<String>>,
    provisional_calls: RwLock<Vec<String>>,
    update_calls: RwLock<Vec<Destination>>,
    select_calls: RwLock<Vec<Destination>>,
    eula_calls: RwLock<Vec<String>>,
}

impl MockDestinationRegistry {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            destinations: RwLock::new(Vec::new()),
            search_in_progress: RwLock::new(false),
            events,
            setup_response: RwLock::new(PrinterSetupResponse::default()),
            local_error: RwLock::new(None),
            provisional_result: RwLock::new(None),
            eula_url: RwLock::new(None),
            snapshot_delay: RwLock::new(None),
            hold: RwLock::new(false),
            release: Notify::new(),
            local_calls: RwLock::new(Vec::new()),
            provisional_calls: RwLock::new(Vec::new()),
            update_calls: RwLock::new(Vec::new()),
            select_calls: RwLock::new(Vec::new()),
            eula_calls: RwLock::new(Vec::new()),
        }
    }

    pub async fn set_destinations(&self, destinations: Vec<Destination>) {
        *self.destinations.write().await = destinations;
    }

    /// Add a destination and announce it
    pub async fn insert(&self, destination: Destination) {
        self.destinations.write().await.push(destination);
        let _ = self.events.send(RegistryEvent::DestinationsInserted);
    }

    pub async fn set_search_in_progress(&self, searching: bool) {
        *self.search_in_progress.write().await = searching;
    }

    pub async fn finish_search(&self) {
        *self.search_in_progress.write().await = false;
        let _ = self.events.send(RegistryEvent::SearchDone);
    }

    pub fn send_status(&self, destination_key: &str, status: PrinterStatus) {
        let _ = self.events.send(RegistryEvent::PrinterStatusUpdated {
            destination_key: destination_key.to_string(),
            status,
        });
    }

    pub fn receiver_count(&self) -> usize {
        self.events.receiver_count()
    }

    pub async fn set_setup_response(&self, response: PrinterSetupResponse) {
        *self.setup_response.write().await = response;
    }

    pub async fn set_local_error(&self, error: Option<String>) {
        *self.local_error.write().await = error;
    }

    pub async fn set_provisional_result(&self, result: Option<Destination>) {
        *self.provisional_result.write().await = result;
    }

    pub async fn set_eula_url(&self, url: Option<String>) {
        *self.eula_url.write().await = url;
    }

    /// Make the next `destinations()` call return a snapshot taken now but
    /// only after `delay`
    pub async fn delay_next_snapshot(&self, delay: Duration) {
        *self.snapshot_delay.write().await = Some(delay);
    }

    pub async fn hold_resolutions(&self, hold: bool) {
        *self.hold.write().await = hold;
    }

    /// Let one held resolution finish
    pub fn release_resolution(&self) {
        self.release.notify_one();
    }

    pub async fn local_calls(&self) -> Vec<String> {
        self.local_calls.read().await.clone()
    }

    pub async fn provisional_calls(&self) -> Vec<String> {
        self.provisional_calls.read().await.clone()
    }

    pub async fn update_calls(&self) -> Vec<Destination> {
        self.update_calls.read().await.clone()
    }

    pub async fn select_calls(&self) -> Vec<Destination> {
        self.select_calls.read().await.clone()
    }

    pub async fn eula_calls(&self) -> Vec<String> {
        self.eula_calls.read().await.clone()
    }

    async fn wait_if_held(&self) {
        let held = *self.hold.read().await;
        if held {
            self.release.notified().await;
        }
    }
}

#[async_trait]
impl DestinationRegistry for MockDestinationRegistry {
    async fn destinations(&self) -> Vec<Destination> {
        let snapshot = self.destinations.read().await.clone();
        let delay = self.snapshot_delay.write().await.take();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        snapshot
    }

    async fn is_search_in_progress(&self) -> bool {
        *self.search_in_progress.read().await
    }

    fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    async fn resolve_local(&self, destination: &Destination) -> CoreResult<PrinterSetupResponse> {
        self.local_calls.write().await.push(destination.id.clone());
        self.wait_if_held().await;

        if let Some(ref msg) = *self.local_error.read().await {
            return Err(CoreError::ConfigurationFailed {
                destination_id: destination.id.clone(),
                message: msg.clone(),
            });
        }
        Ok(self.setup_response.read().await.clone())
    }

    async fn resolve_provisional(&self, destination: &Destination) -> CoreResult<Destination> {
        self.provisional_calls
            .write()
            .await
            .push(destination.id.clone());
        self.wait_if_held().await;

        self.provisional_result
            .read()
            .await
            .clone()
            .ok_or_else(|| CoreError::RegistryError("permission denied".to_string()))
    }

    async fn update_destination(&self, destination: &Destination) {
        self.update_calls.write().await.push(destination.clone());
        let mut store = self.destinations.write().await;
        if let Some(existing) = store.iter_mut().find(|d| d.key == destination.key) {
            *existing = destination.clone();
        }
    }

    async fn select(&self, destination: &Destination) {
        self.select_calls.write().await.push(destination.clone());
    }

    async fn fetch_eula_url(&self, destination_id: &str) -> CoreResult<String> {
        self.eula_calls
            .write()
            .await
            .push(destination_id.to_string());
        self.eula_url
            .read()
            .await
            .clone()
            .ok_or_else(|| CoreError::EulaUnavailable(destination_id.to_string()))
    }
}

// ===== MockPrintServerRegistry =====

pub struct MockPrintServerRegistry {
    config: RwLock<PrintServersConfig>,
    events: broadcast::Sender<PrintServerEvent>,
    chosen: RwLock<Vec<String>>,
}

impl MockPrintServerRegistry {
    pub fn new() -> Self {
        Self::with_capacity(32)
    }

    /// Event channel with `capacity` slots, to force lagging receivers
    pub fn with_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        Self {
            config: RwLock::new(PrintServersConfig::default()),
            events,
            chosen: RwLock::new(Vec::new()),
        }
    }

    pub fn set_loading(&self, loading: bool) {
        let _ = self
            .events
            .send(PrintServerEvent::ServerPrintersLoading(loading));
    }

    pub fn change_servers(&self, config: PrintServersConfig) {
        let _ = self.events.send(PrintServerEvent::ServersChanged(config));
    }

    pub async fn set_config(&self, config: PrintServersConfig) {
        *self.config.write().await = config;
    }

    pub async fn chosen(&self) -> Vec<String> {
        self.chosen.read().await.clone()
    }
}

#[async_trait]
impl PrintServerRegistry for MockPrintServerRegistry {
    async fn config(&self) -> CoreResult<PrintServersConfig> {
        Ok(self.config.read().await.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<PrintServerEvent> {
        self.events.subscribe()
    }

    async fn choose_print_server(&self, server_name: &str) -> CoreResult<()> {
        self.chosen.write().await.push(server_name.to_string());
        Ok(())
    }
}

// ===== Factory =====

/// 创建测试用的 DestinationDialogController（连同 mock 协作者）
pub fn create_test_controller(
    config: DialogConfig,
) -> (
    Arc<DestinationDialogController>,
    Arc<MockDestinationRegistry>,
    Arc<MockPrintServerRegistry>,
) {
    let registry = Arc::new(MockDestinationRegistry::new());
    let servers = Arc::new(MockPrintServerRegistry::new());
    let ctx = Arc::new(DialogContext::with_registry_handshake(
        registry.clone(),
        servers.clone(),
    ));
    let controller = Arc::new(DestinationDialogController::new(ctx, config));
    (controller, registry, servers)
}
