use cetane::prelude::*;

pub fn migration() -> Migration {
    Migration::new("0002_lookup_indexes")
        .depends_on(&["0001_initial_schema"])
        .operation(AddIndex::new(
            "product",
            Index::new("idx_product_name").column("name"),
        ))
        .operation(AddIndex::new(
            "product_price",
            Index::new("idx_product_price_product_observed")
                .column("product_id")
                .column("observed_at"),
        ))
        .operation(AddIndex::new(
            "scrape_job",
            Index::new("idx_scrape_job_created_at").column("created_at"),
        ))
}
