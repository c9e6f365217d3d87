use crate::core::{CatalogSource, Product, RecordId, Result};
use chrono::{DateTime, Utc};

/// Snapshot of the product list; the core only reads it.
#[derive(Debug, Clone, Default)]
pub struct CatalogMirror {
    products: Vec<Product>,
    synced_at: Option<DateTime<Utc>>,
}

impl CatalogMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sync<C: CatalogSource + ?Sized>(&mut self, source: &C) -> Result<usize> {
        let products = source.list_products().await?;
        tracing::debug!("Catalog synced: {} products", products.len());
        self.products = products;
        self.synced_at = Some(Utc::now());
        Ok(self.products.len())
    }

    pub fn is_synced(&self) -> bool {
        self.synced_at.is_some()
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// What a shopper can browse.
    pub fn active_products(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.active)
    }

    pub fn find(&self, item_id: &RecordId) -> Option<&Product> {
        self.products.iter().find(|p| &p.item_id == item_id)
    }

    pub fn upsert(&mut self, product: Product) {
        match self
            .products
            .iter_mut()
            .find(|p| p.item_id == product.item_id)
        {
            Some(existing) => *existing = product,
            None => self.products.push(product),
        }
    }

    pub fn remove(&mut self, item_id: &RecordId) -> Option<Product> {
        let index = self.products.iter().position(|p| &p.item_id == item_id)?;
        Some(self.products.remove(index))
    }
}
