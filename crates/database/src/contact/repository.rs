use crate::{contact::model::Contact, Database};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use utils::AppResult;

pub type DynContactRepository = Arc<dyn ContactRepositoryTrait + Send + Sync>;

#[async_trait]
pub trait ContactRepositoryTrait {
    async fn create_contact(&self, contact: Contact) -> AppResult<Contact>;
}

#[async_trait]
impl ContactRepositoryTrait for Database {
    async fn create_contact(&self, mut contact: Contact) -> AppResult<Contact> {
        let result = self.contacts.insert_one(&contact, None).await?;
        contact.id = result.inserted_id.as_object_id();

        info!("✉️ contact message stored from {}", contact.email);
        Ok(contact)
    }
}
