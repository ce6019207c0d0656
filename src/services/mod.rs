pub mod applications;
pub mod gateway;
pub mod identity;
pub mod notifications;
pub mod payments;
pub mod stats;

use std::sync::Arc;

pub use applications::ApplicationService;
pub use gateway::{GatewayReceipt, PaymentGateway, SimulatedGateway};
pub use identity::IdentityResolver;
pub use notifications::NotificationDispatcher;
pub use payments::{PaymentService, RequestSettlement};
pub use stats::{ApplicationStats, PaymentStats, StatsService};

use crate::config::PaymentSettings;
use crate::ports::Repositories;

/// Every service, wired over one set of repositories.
#[derive(Clone)]
pub struct Services {
    pub identity: IdentityResolver,
    pub applications: ApplicationService,
    pub payments: PaymentService,
    pub notifications: NotificationDispatcher,
    pub stats: StatsService,
}

impl Services {
    pub fn new(repos: &Repositories, settings: &PaymentSettings) -> Self {
        let gateway = Arc::new(SimulatedGateway::new(
            settings.gateway_signing_secret.clone(),
        ));
        Self::with_gateway(repos, settings, gateway)
    }

    pub fn with_gateway(
        repos: &Repositories,
        settings: &PaymentSettings,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let notifications = NotificationDispatcher::new(repos.notifications.clone());
        Self {
            identity: IdentityResolver::new(repos.users.clone()),
            applications: ApplicationService::new(repos, notifications.clone(), settings),
            payments: PaymentService::new(repos, notifications.clone(), gateway, settings),
            notifications,
            stats: StatsService::new(repos),
        }
    }
}
