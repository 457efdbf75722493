use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Product, ProductWrite},
    events::{EventProducers, ProductWrittenEvent},
    traits::{SettlementGatewayDatabase, SettlementGatewayError},
};

/// Catalog management API. Every mutation publishes a [`ProductWrittenEvent`] so that the
/// stock-consistency pass sees catalog edits as well as settlement decrements.
pub struct CatalogApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi")
    }
}

impl<B> CatalogApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> CatalogApi<B>
where B: SettlementGatewayDatabase
{
    pub async fn create_product(&self, product: ProductWrite) -> Result<Product, SettlementGatewayError> {
        let product = self.db.create_product(product).await?;
        info!("🛍️ Product {} created.", product.id);
        self.call_product_written_hook(&product.id).await;
        Ok(product)
    }

    pub async fn update_product(
        &self,
        product_id: &str,
        product: ProductWrite,
    ) -> Result<Option<Product>, SettlementGatewayError> {
        let updated = self.db.update_product(product_id, product).await?;
        if updated.is_some() {
            debug!("🛍️ Product {product_id} updated.");
            self.call_product_written_hook(product_id).await;
        }
        Ok(updated)
    }

    /// Deletes a product. Returns false if no product matched the id. A delete is still a product
    /// write; the consistency pass sees the event and no-ops on the missing document.
    pub async fn delete_product(&self, product_id: &str) -> Result<bool, SettlementGatewayError> {
        let deleted = self.db.delete_product(product_id).await?;
        if deleted {
            info!("🛍️ Product {product_id} deleted.");
            self.call_product_written_hook(product_id).await;
        }
        Ok(deleted)
    }

    pub async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, SettlementGatewayError> {
        self.db.fetch_product(product_id).await
    }

    pub async fn fetch_products(&self) -> Result<Vec<Product>, SettlementGatewayError> {
        self.db.fetch_products().await
    }

    async fn call_product_written_hook(&self, product_id: &str) {
        for emitter in &self.producers.product_written_producer {
            emitter.publish_event(ProductWrittenEvent::new(product_id)).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
