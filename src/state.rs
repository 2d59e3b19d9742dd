use std::sync::Arc;

use crate::application::services::{AuthService, LifecycleService, LinkService, LinkSettings};
use crate::domain::lifecycle::LifecyclePolicy;
use crate::domain::repositories::LinkRepository;
use crate::utils::id_generator::OsIdGenerator;

#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService<dyn LinkRepository>>,
    pub lifecycle_service: Arc<LifecycleService<dyn LinkRepository>>,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    /// Wires the services around one link store, drawing ids from the OS CSPRNG.
    pub fn new(
        repository: Arc<dyn LinkRepository>,
        auth_service: AuthService,
        policy: LifecyclePolicy,
        settings: LinkSettings,
    ) -> Self {
        let auth_service = Arc::new(auth_service);

        let link_service = Arc::new(LinkService::new(
            repository.clone(),
            Arc::new(OsIdGenerator),
            auth_service.clone(),
            policy,
            settings,
        ));
        let lifecycle_service = Arc::new(LifecycleService::new(repository, policy));

        Self {
            link_service,
            lifecycle_service,
            auth_service,
        }
    }
}
