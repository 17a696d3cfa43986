use std::sync::Arc;

use bytes::Bytes;
use futures::stream;
use uuid::Uuid;

use docvault_core::config::AppConfig;
use docvault_core::events::EventBus;
use docvault_database::Stores;
use docvault_entity::document::CreateDocument;
use docvault_service::{ActorContext, Services};
use docvault_storage::MemoryContentStore;

pub fn services() -> Services {
    Services::new(
        Stores::memory(),
        Arc::new(MemoryContentStore::new()),
        EventBus::default(),
        &AppConfig::default(),
    )
}

pub async fn register(services: &Services, content: &str) {
    let ctx = ActorContext::new(Uuid::new_v4(), None);
    let chunk: Result<Bytes, std::io::Error> = Ok(Bytes::from(content.to_string()));
    services
        .intake
        .register_document(
            &ctx,
            CreateDocument {
                title: "Police check".to_string(),
                description: None,
                category: "screening".to_string(),
                owner_id: ctx.actor_id,
                mime_type: None,
                requires_approval: false,
                assignee_id: None,
                required_role: None,
            },
            Box::pin(stream::iter(vec![chunk])),
        )
        .await
        .unwrap();
}
