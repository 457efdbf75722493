use crate::db_types::{LineItem, Variant};

/// The outcome of matching an order line item against a product's variant list.
///
/// `Unresolved` is a deliberate, explicit result rather than an error: catalog data may be
/// inconsistent (imported items, legacy orders), and callers must decide what to do with the
/// fallback path instead of having a sentinel index slip through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantMatch {
    Resolved(usize),
    Unresolved,
}

impl VariantMatch {
    pub fn index(&self) -> Option<usize> {
        match self {
            VariantMatch::Resolved(idx) => Some(*idx),
            VariantMatch::Unresolved => None,
        }
    }
}

fn trimmed(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// Best-effort variant match by id, then SKU, then title, then a title synthesized from the line
/// item's option selections. Each step is only tried when the previous one found nothing and the
/// corresponding line-item field is present and non-empty.
pub fn resolve_variant(variants: &[Variant], item: &LineItem) -> VariantMatch {
    if variants.is_empty() {
        return VariantMatch::Unresolved;
    }

    if let Some(want) = trimmed(item.variant_id.as_ref()) {
        if let Some(idx) = variants.iter().position(|v| trimmed(v.id.as_ref()) == Some(want)) {
            return VariantMatch::Resolved(idx);
        }
    }
    if let Some(want) = trimmed(item.variant_sku.as_ref()) {
        if let Some(idx) = variants.iter().position(|v| trimmed(v.sku.as_ref()) == Some(want)) {
            return VariantMatch::Resolved(idx);
        }
    }
    if let Some(want) = trimmed(item.variant_title.as_ref()) {
        if let Some(idx) = variants.iter().position(|v| trimmed(v.title.as_ref()) == Some(want)) {
            return VariantMatch::Resolved(idx);
        }
    }
    // Synthesize "Size / Color"-style titles from the option values, in the map's own insertion
    // order, skipping empty selections.
    if let Some(options) = item.options.as_ref() {
        let built = options
            .values()
            .filter_map(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" / ");
        if !built.is_empty() {
            if let Some(idx) = variants.iter().position(|v| trimmed(v.title.as_ref()) == Some(built.as_str())) {
                return VariantMatch::Resolved(idx);
            }
        }
    }
    VariantMatch::Unresolved
}
