use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    modules::{documents::DocumentStore, school::SchoolDirectory, services::ServicesCatalog},
};

#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    documents: DocumentStore,
    catalog: Arc<RwLock<ServicesCatalog>>,
    school: Arc<RwLock<SchoolDirectory>>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let documents = match config.database_url.as_deref() {
            Some(url) => DocumentStore::connect(url).await?,
            None => {
                warn!("DATABASE_URL is not set; documents are kept in memory only");
                DocumentStore::in_memory()
            }
        };

        tokio::fs::create_dir_all(config.document_upload_dir())
            .await
            .with_context(|| {
                format!(
                    "failed to ensure upload directory at {}",
                    config.document_upload_dir().display()
                )
            })?;

        info!(backend = documents.backend_name(), "application state ready");
        Ok(Self::with_store(config, documents))
    }

    pub fn with_store(config: AppConfig, documents: DocumentStore) -> Self {
        Self {
            config: Arc::new(config),
            documents,
            catalog: Arc::new(RwLock::new(ServicesCatalog::seed())),
            school: Arc::new(RwLock::new(SchoolDirectory::seed())),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub fn catalog(&self) -> &RwLock<ServicesCatalog> {
        &self.catalog
    }

    pub fn school(&self) -> &RwLock<SchoolDirectory> {
        &self.school
    }
}
