use crate::dtos::contact_dto::ContactDto;
use async_trait::async_trait;
use database::contact::{model::Contact, repository::DynContactRepository};
use std::sync::Arc;
use tracing::info;
use utils::AppResult;

pub type DynContactService = Arc<dyn ContactServiceTrait + Send + Sync>;

#[async_trait]
pub trait ContactServiceTrait {
    async fn create(&self, request: ContactDto) -> AppResult<Contact>;
}

#[derive(Clone)]
pub struct ContactService {
    repository: DynContactRepository,
}

impl ContactService {
    pub fn new(repository: DynContactRepository) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl ContactServiceTrait for ContactService {
    async fn create(&self, request: ContactDto) -> AppResult<Contact> {
        let contact = Contact {
            id: None,
            name: request.name,
            email: request.email,
            message: request.message,
        };

        let created = self.repository.create_contact(contact).await?;
        info!("📨 contact message from {}", created.email);
        Ok(created)
    }
}
