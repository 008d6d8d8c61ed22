use crate::domain::value_objects::LineId;
use serde::{Deserialize, Serialize};

/// Product data a caller hands to `add_item`: a cart line minus identity and
/// quantity. Prices are denormalized snapshots in minor currency units and are
/// never re-fetched from the catalog once the line exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineDraft {
    pub product_id: String,
    pub name: String,
    pub unit_price_minor: i64,
    pub original_unit_price_minor: Option<i64>,
    pub image_url: String,
    pub category: String,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl CartLineDraft {
    /// Whether `line` holds the same (product, size, color) variant.
    pub fn matches(&self, line: &CartLine) -> bool {
        self.product_id == line.product_id && self.size == line.size && self.color == line.color
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: LineId,
    pub product_id: String,
    pub name: String,
    pub unit_price_minor: i64,
    pub original_unit_price_minor: Option<i64>,
    pub image_url: String,
    pub category: String,
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl CartLine {
    pub fn new(draft: CartLineDraft, quantity: u32) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: LineId::generate(),
            product_id: draft.product_id,
            name: draft.name,
            unit_price_minor: draft.unit_price_minor,
            original_unit_price_minor: draft.original_unit_price_minor,
            image_url: draft.image_url,
            category: draft.category,
            quantity,
            size: draft.size,
            color: draft.color,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn subtotal_minor(&self) -> i64 {
        self.unit_price_minor * i64::from(self.quantity)
    }

    /// The line's display snapshot, for re-submitting it to another store.
    pub fn draft(&self) -> CartLineDraft {
        CartLineDraft {
            product_id: self.product_id.clone(),
            name: self.name.clone(),
            unit_price_minor: self.unit_price_minor,
            original_unit_price_minor: self.original_unit_price_minor,
            image_url: self.image_url.clone(),
            category: self.category.clone(),
            size: self.size.clone(),
            color: self.color.clone(),
        }
    }
}

/// An ordered sequence of cart lines.
///
/// Invariant: the (product_id, size, color) key is unique across lines; an
/// addition matching an existing line increments its quantity instead of
/// appending a duplicate. Lines keep arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn find(&self, id: &LineId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.id == id)
    }

    /// Adds `quantity` of the drafted product, collapsing onto an existing
    /// line with the same variant key if one exists. Returns the affected
    /// line.
    pub fn upsert(&mut self, draft: CartLineDraft, quantity: u32) -> &CartLine {
        let now = chrono::Utc::now().timestamp_millis();
        let idx = match self.lines.iter().position(|line| draft.matches(line)) {
            Some(idx) => {
                let line = &mut self.lines[idx];
                line.quantity = line.quantity.saturating_add(quantity);
                line.updated_at = now;
                idx
            }
            None => {
                self.lines.push(CartLine::new(draft, quantity));
                self.lines.len() - 1
            }
        };
        &self.lines[idx]
    }

    /// Sets a line's quantity. Zero deletes the line; a quantity below one is
    /// never stored. Returns false if the line does not exist.
    pub fn set_quantity(&mut self, id: &LineId, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(id);
        }
        match self.lines.iter_mut().find(|line| &line.id == id) {
            Some(line) => {
                line.quantity = quantity;
                line.updated_at = chrono::Utc::now().timestamp_millis();
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &LineId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| &line.id != id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of `unit_price_minor * quantity` over all lines, recomputed on
    /// every call.
    pub fn total_minor(&self) -> i64 {
        self.lines.iter().map(CartLine::subtotal_minor).sum()
    }

    /// Sum of quantities (not line count), from the same line set as
    /// `total_minor`.
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(product_id: &str, price: i64, size: Option<&str>, color: Option<&str>) -> CartLineDraft {
        CartLineDraft {
            product_id: product_id.to_string(),
            name: format!("Product {product_id}"),
            unit_price_minor: price,
            original_unit_price_minor: None,
            image_url: format!("/images/{product_id}.jpg"),
            category: "apparel".to_string(),
            size: size.map(str::to_string),
            color: color.map(str::to_string),
        }
    }

    #[test]
    fn upsert_collapses_same_variant_into_one_line() {
        let mut cart = Cart::new();
        cart.upsert(draft("p1", 1299, Some("M"), Some("Red")), 1);
        cart.upsert(draft("p1", 1299, Some("M"), Some("Red")), 1);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[test]
    fn upsert_keeps_distinct_variants_separate() {
        let mut cart = Cart::new();
        cart.upsert(draft("p1", 1299, Some("M"), Some("Red")), 1);
        cart.upsert(draft("p1", 1299, Some("L"), Some("Red")), 1);
        cart.upsert(draft("p1", 1299, Some("M"), Some("Blue")), 1);

        assert_eq!(cart.len(), 3);
    }

    #[test]
    fn upsert_aggregates_quantities_across_many_adds() {
        let mut cart = Cart::new();
        for qty in [1u32, 2, 3, 4] {
            cart.upsert(draft("p1", 500, None, None), qty);
        }

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].quantity, 10);
    }

    #[test]
    fn upsert_saturates_instead_of_overflowing() {
        let mut cart = Cart::new();
        cart.upsert(draft("p1", 100, None, None), u32::MAX);
        cart.upsert(draft("p1", 100, None, None), 2);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].quantity, u32::MAX);
    }

    #[test]
    fn set_quantity_zero_removes_the_line() {
        let mut cart = Cart::new();
        cart.upsert(draft("p1", 1299, None, None), 3);
        let id = cart.lines()[0].id.clone();

        assert!(cart.set_quantity(&id, 0));
        assert!(cart.is_empty());
        assert!(cart.find(&id).is_none());
    }

    #[test]
    fn set_quantity_unknown_line_returns_false() {
        let mut cart = Cart::new();
        assert!(!cart.set_quantity(&LineId::generate(), 2));
    }

    #[test]
    fn total_matches_sum_of_line_subtotals() {
        let mut cart = Cart::new();
        cart.upsert(draft("p1", 1299, None, None), 2);
        cart.upsert(draft("p2", 2499, None, None), 1);

        assert_eq!(cart.total_minor(), 1299 * 2 + 2499);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn total_is_recomputed_after_mutation() {
        let mut cart = Cart::new();
        cart.upsert(draft("p1", 1000, None, None), 2);
        let id = cart.lines()[0].id.clone();
        assert_eq!(cart.total_minor(), 2000);

        cart.set_quantity(&id, 5);
        assert_eq!(cart.total_minor(), 5000);
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn lines_keep_arrival_order() {
        let mut cart = Cart::new();
        cart.upsert(draft("p3", 100, None, None), 1);
        cart.upsert(draft("p1", 100, None, None), 1);
        cart.upsert(draft("p2", 100, None, None), 1);

        let order: Vec<_> = cart.lines().iter().map(|l| l.product_id.as_str()).collect();
        assert_eq!(order, ["p3", "p1", "p2"]);
    }
}
