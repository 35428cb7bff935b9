use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

use crate::models::{ActivityEntry, Document, ExtractedInvoice, UploadJob};
use crate::pipeline::JobStore;

pub mod activity;
pub mod documents;
pub mod invoices;
pub mod jobs;
pub mod usage;
pub mod users;

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabasePoolHealth {
    pub size: u32,
    pub num_idle: usize,
    pub is_closed: bool,
}

#[derive(Clone)]
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .min_connections(2)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool_config(database_url: &str, max_connections: u32, min_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(60))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(900))
            .min_connections(min_connections)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn get_pool_health(&self) -> DatabasePoolHealth {
        DatabasePoolHealth {
            size: self.pool.size(),
            num_idle: self.pool.num_idle(),
            is_closed: self.pool.is_closed(),
        }
    }

    /// True when a connection can be acquired within five seconds.
    pub async fn check_pool_health(&self) -> bool {
        match tokio::time::timeout(Duration::from_secs(5), self.pool.acquire()).await {
            Ok(Ok(_conn)) => true,
            Ok(Err(e)) => {
                tracing::warn!("Database pool health check failed: {}", e);
                false
            }
            Err(_) => {
                tracing::warn!("Database pool health check timed out");
                false
            }
        }
    }
}

#[async_trait]
impl JobStore for Database {
    async fn create_job(&self, job: &UploadJob) -> Result<()> {
        self.create_upload_job(job).await
    }

    async fn update_job(&self, job: &UploadJob) -> Result<()> {
        self.update_upload_job(job).await
    }

    async fn create_document(&self, document: &Document) -> Result<()> {
        Database::create_document(self, document).await
    }

    async fn create_invoice(&self, invoice: &ExtractedInvoice) -> Result<()> {
        self.create_extracted_invoice(invoice).await
    }

    async fn log_activity(&self, entry: &ActivityEntry) -> Result<()> {
        self.create_activity_entry(entry).await
    }
}
