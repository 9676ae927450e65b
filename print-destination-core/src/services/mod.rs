//! 业务逻辑服务层

mod destination_dialog;
mod loading_timer_gate;
mod provisional_resolver;

pub use destination_dialog::DestinationDialogController;
pub use loading_timer_gate::LoadingTimerGate;
pub use provisional_resolver::{ProvisionalDestinationResolver, ResolverState};

use std::sync::Arc;

use crate::traits::{DestinationRegistry, PrintServerRegistry, ProvisionalResolver};

/// 对话框上下文 - 持有所有协作者
///
/// 外壳层创建此上下文，并注入具体的注册表实现。
pub struct DialogContext {
    destination_registry: Arc<dyn DestinationRegistry>,
    print_server_registry: Arc<dyn PrintServerRegistry>,
    provisional_resolver: Arc<dyn ProvisionalResolver>,
}

impl DialogContext {
    /// 创建对话框上下文
    #[must_use]
    pub fn new(
        destination_registry: Arc<dyn DestinationRegistry>,
        print_server_registry: Arc<dyn PrintServerRegistry>,
        provisional_resolver: Arc<dyn ProvisionalResolver>,
    ) -> Self {
        Self {
            destination_registry,
            print_server_registry,
            provisional_resolver,
        }
    }

    /// Build a context whose provisional resolver runs the destination
    /// registry's own handshake.
    #[must_use]
    pub fn with_registry_handshake(
        destination_registry: Arc<dyn DestinationRegistry>,
        print_server_registry: Arc<dyn PrintServerRegistry>,
    ) -> Self {
        let provisional_resolver = Arc::new(ProvisionalDestinationResolver::new(Arc::clone(
            &destination_registry,
        )));
        Self::new(
            destination_registry,
            print_server_registry,
            provisional_resolver,
        )
    }

    #[must_use]
    pub fn destination_registry(&self) -> &Arc<dyn DestinationRegistry> {
        &self.destination_registry
    }

    #[must_use]
    pub fn print_server_registry(&self) -> &Arc<dyn PrintServerRegistry> {
        &self.print_server_registry
    }

    #[must_use]
    pub fn provisional_resolver(&self) -> &Arc<dyn ProvisionalResolver> {
        &self.provisional_resolver
    }
}
