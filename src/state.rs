use std::sync::Arc;

use crate::{
    auth::jwt::JwtService,
    config::AppConfig,
    repo::{
        attachments::AttachmentRepository, records::RecordRepository, users::UserRepository,
        violations::ViolationRepository,
    },
    store::KeyValueStore,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KeyValueStore>,
    pub config: Arc<AppConfig>,
    pub jwt: JwtService,
}

impl AppState {
    pub fn new(store: Arc<dyn KeyValueStore>, config: AppConfig, jwt: JwtService) -> Self {
        Self {
            store,
            config: Arc::new(config),
            jwt,
        }
    }

    pub fn records(&self) -> RecordRepository {
        RecordRepository::new(self.store.clone())
    }

    pub fn attachments(&self) -> AttachmentRepository {
        AttachmentRepository::new(self.store.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.store.clone())
    }

    pub fn violations(&self) -> ViolationRepository {
        ViolationRepository::new(self.store.clone())
    }
}
