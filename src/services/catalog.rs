//! Read and curation operations on the product catalog.

use tracing::info;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{Favourite, Page, PriceSeries, Product, ProductPrice, TrackedProduct};
use crate::repository::util::is_unique_violation;
use crate::repository::DbContext;

/// One page of the product listing.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub page: Page,
    pub total: i64,
}

impl ProductPage {
    pub fn page_count(&self) -> i64 {
        self.page.page_count(self.total)
    }
}

/// Catalog queries plus favourite and tracking marks.
pub struct CatalogService<'a> {
    ctx: &'a DbContext,
}

impl<'a> CatalogService<'a> {
    pub fn new(ctx: &'a DbContext) -> Self {
        Self { ctx }
    }

    /// Get a product or fail with NotFound.
    pub async fn product(&self, id: i32) -> CatalogResult<Product> {
        self.ctx
            .products()
            .get(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("Product", id))
    }

    /// All products ordered by name.
    pub async fn products(&self) -> CatalogResult<Vec<Product>> {
        Ok(self.ctx.products().list(None).await?)
    }

    /// One page of products ordered by name.
    pub async fn product_page(&self, page: Page) -> CatalogResult<ProductPage> {
        let products = self.ctx.products().list(Some(page)).await?;
        let total = self.ctx.products().count().await?;
        Ok(ProductPage {
            products,
            page,
            total,
        })
    }

    /// Price history of a product, oldest first.
    pub async fn history(&self, id: i32) -> CatalogResult<Vec<ProductPrice>> {
        self.product(id).await?;
        Ok(self.ctx.prices().history(id).await?)
    }

    /// Price history of a product shaped for display.
    pub async fn price_series(&self, id: i32) -> CatalogResult<PriceSeries> {
        let product = self.product(id).await?;
        let history = self.ctx.prices().history(id).await?;
        Ok(PriceSeries::from_history(&product, &history))
    }

    /// Delete a product along with its prices and marks.
    pub async fn delete_product(&self, id: i32) -> CatalogResult<()> {
        if !self.ctx.products().delete(id).await? {
            return Err(CatalogError::not_found("Product", id));
        }
        info!(product_id = id, "product deleted");
        Ok(())
    }

    pub async fn favourite(&self, product_id: i32) -> CatalogResult<Favourite> {
        self.product(product_id).await?;
        let marks = self.ctx.favourites();
        if marks.exists(product_id).await? {
            return Err(already_marked(product_id, "already a favourite"));
        }

        // The UNIQUE constraint still catches a concurrent insert.
        match marks.insert(product_id).await {
            Ok(fav) => Ok(fav),
            Err(e) if is_unique_violation(&e) => {
                Err(already_marked(product_id, "already a favourite"))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn unfavourite(&self, product_id: i32) -> CatalogResult<()> {
        if !self.ctx.favourites().remove(product_id).await? {
            return Err(CatalogError::not_found("Favourite", product_id));
        }
        Ok(())
    }

    pub async fn is_favourite(&self, product_id: i32) -> CatalogResult<bool> {
        Ok(self.ctx.favourites().exists(product_id).await?)
    }

    pub async fn is_tracked(&self, product_id: i32) -> CatalogResult<bool> {
        Ok(self.ctx.tracked().exists(product_id).await?)
    }

    pub async fn favourites(&self) -> CatalogResult<Vec<(Favourite, Product)>> {
        Ok(self.ctx.favourites().list().await?)
    }

    pub async fn track(&self, product_id: i32) -> CatalogResult<TrackedProduct> {
        self.product(product_id).await?;
        let marks = self.ctx.tracked();
        if marks.exists(product_id).await? {
            return Err(already_marked(product_id, "already tracked"));
        }

        // The UNIQUE constraint still catches a concurrent insert.
        match marks.insert(product_id).await {
            Ok(tracked) => Ok(tracked),
            Err(e) if is_unique_violation(&e) => {
                Err(already_marked(product_id, "already tracked"))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn untrack(&self, product_id: i32) -> CatalogResult<()> {
        if !self.ctx.tracked().remove(product_id).await? {
            return Err(CatalogError::not_found("Tracked product", product_id));
        }
        Ok(())
    }

    pub async fn tracked(&self) -> CatalogResult<Vec<(TrackedProduct, Product)>> {
        Ok(self.ctx.tracked().list().await?)
    }
}

fn already_marked(product_id: i32, what: &str) -> CatalogError {
    CatalogError::Conflict(format!("Product {} is {}", product_id, what))
}
