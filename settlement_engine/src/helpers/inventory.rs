use crate::db_types::{Product, Variant};

/// The effective stock of a single variant: `max(0, stock ?? quantity ?? 0)`.
///
/// `quantity` is a legacy alias still present on imported catalog records. Negative counts are
/// clamped to zero so that drifted documents cannot drag the aggregate below zero.
pub fn variant_stock(variant: &Variant) -> i64 {
    variant.stock.or(variant.quantity).unwrap_or(0).max(0)
}

/// The aggregate stock of a variant list. Commutative over the list order, which keeps the
/// re-derivation idempotent no matter how the document was last written.
pub fn aggregate_stock(variants: &[Variant]) -> i64 {
    variants.iter().map(variant_stock).sum()
}

/// A product's sellable stock: the variant aggregate when variants exist, otherwise the stored
/// product-level count, which is authoritative on its own for variant-less products.
pub fn product_stock(product: &Product) -> i64 {
    if product.variants.is_empty() {
        product.stock.max(0)
    } else {
        aggregate_stock(&product.variants)
    }
}

pub fn is_available(product: &Product) -> bool {
    product_stock(product) > 0
}

/// Clamp a desired order quantity to what is actually in stock. Used by the storefront-facing
/// order draft endpoint; the settlement path floors at zero instead (over-ordering is settled
/// best-effort, never rejected after payment).
pub fn clamp_to_available(product: &Product, desired: i64) -> i64 {
    desired.clamp(0, product_stock(product))
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use sqlx::types::Json;

    use super::*;

    fn product_with(stock: i64, variants: Vec<Variant>) -> Product {
        Product {
            id: "P1".to_string(),
            name: "Widget".to_string(),
            price: 1000.into(),
            stock,
            variants: Json(variants),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn variant_stock_falls_back_to_quantity() {
        let v = Variant { quantity: Some(4), ..Default::default() };
        assert_eq!(variant_stock(&v), 4);
        let v = Variant { stock: Some(2), quantity: Some(9), ..Default::default() };
        assert_eq!(variant_stock(&v), 2);
        assert_eq!(variant_stock(&Variant::default()), 0);
    }

    #[test]
    fn negative_variant_stock_is_clamped() {
        let v = Variant { stock: Some(-3), ..Default::default() };
        assert_eq!(variant_stock(&v), 0);
        let vs = vec![v, Variant { stock: Some(5), ..Default::default() }];
        assert_eq!(aggregate_stock(&vs), 5);
    }

    #[test]
    fn aggregate_is_order_independent() {
        let a = Variant { stock: Some(3), ..Default::default() };
        let b = Variant { stock: Some(7), ..Default::default() };
        assert_eq!(aggregate_stock(&[a.clone(), b.clone()]), aggregate_stock(&[b, a]));
    }

    #[test]
    fn variantless_product_uses_own_stock() {
        let p = product_with(12, vec![]);
        assert_eq!(product_stock(&p), 12);
        assert!(is_available(&p));
    }

    #[test]
    fn aggregate_overrides_stored_stock() {
        // Stored aggregate has drifted; the variant sum wins.
        let p = product_with(100, vec![
            Variant { stock: Some(4), ..Default::default() },
            Variant { stock: Some(6), ..Default::default() },
        ]);
        assert_eq!(product_stock(&p), 10);
    }

    #[test]
    fn clamping() {
        let p = product_with(3, vec![]);
        assert_eq!(clamp_to_available(&p, 10), 3);
        assert_eq!(clamp_to_available(&p, 2), 2);
        assert_eq!(clamp_to_available(&p, -1), 0);
    }
}
