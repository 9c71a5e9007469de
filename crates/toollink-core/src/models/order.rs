//! Order domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Round a currency amount to 2 decimal places.
pub fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Order lifecycle. Forward-only through
/// `Pending → Processing → Completed`; `Cancelled` is reachable from
/// any non-terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    fn rank(self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Processing => 1,
            OrderStatus::Completed => 2,
            OrderStatus::Cancelled => 3,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Whether the transition `self → next` is legal.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        if next == OrderStatus::Cancelled {
            return !self.is_terminal();
        }
        !self.is_terminal() && next.rank() > self.rank()
    }
}

/// One ordered line item. `subtotal` is always
/// `unit_price * quantity`, computed server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub item_id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub subtotal: f64,
}

/// Aggregate pricing breakdown. Invariant:
/// `total == subtotal + tax + delivery_charge - discount` within
/// currency rounding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPricing {
    pub subtotal: f64,
    pub tax: f64,
    pub delivery_charge: f64,
    pub discount: f64,
    pub total: f64,
}

impl OrderPricing {
    /// Build the breakdown from line items and charges, computing the
    /// total server-side.
    pub fn compute(items: &[OrderItem], tax_rate: f64, delivery_charge: f64, discount: f64) -> Self {
        let subtotal = round_currency(items.iter().map(|i| i.subtotal).sum());
        let tax = round_currency(subtotal * tax_rate);
        let delivery_charge = round_currency(delivery_charge);
        let discount = round_currency(discount);
        let total = round_currency(subtotal + tax + delivery_charge - discount);
        Self {
            subtotal,
            tax,
            delivery_charge,
            discount,
            total,
        }
    }

    /// Whether the stored breakdown reconciles.
    pub fn reconciles(&self) -> bool {
        let expected =
            round_currency(self.subtotal + self.tax + self.delivery_charge - self.discount);
        (self.total - expected).abs() < 0.005
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeliveryPreferences {
    pub address: Option<String>,
    pub instructions: Option<String>,
    pub preferred_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    /// Human-facing unique order number, e.g. `ORD-1A2B3C4D`. Immutable.
    pub order_number: String,
    pub customer_id: Uuid,
    pub items: Vec<OrderItem>,
    pub pricing: OrderPricing,
    pub status: OrderStatus,
    pub delivery: DeliveryPreferences,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrder {
    pub order_number: String,
    pub customer_id: Uuid,
    pub items: Vec<OrderItem>,
    pub pricing: OrderPricing,
    pub delivery: DeliveryPreferences,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateOrder {
    pub status: Option<OrderStatus>,
    pub delivery: Option<DeliveryPreferences>,
}

/// Aggregate order statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OrderStats {
    pub total_orders: u64,
    pub pending: u64,
    pub processing: u64,
    pub completed: u64,
    pub cancelled: u64,
    /// Revenue across non-cancelled orders.
    pub revenue: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: u32, unit_price: f64) -> OrderItem {
        OrderItem {
            item_id: Uuid::new_v4(),
            name: "Cordless Drill".into(),
            quantity,
            unit_price,
            subtotal: round_currency(unit_price * quantity as f64),
        }
    }

    #[test]
    fn pricing_total_reconciles() {
        let items = vec![item(3, 19.99), item(1, 4.50)];
        let pricing = OrderPricing::compute(&items, 0.08, 5.0, 2.5);
        assert_eq!(pricing.subtotal, 64.47);
        assert!(pricing.reconciles());
        assert_eq!(
            pricing.total,
            round_currency(pricing.subtotal + pricing.tax + 5.0 - 2.5)
        );
    }

    #[test]
    fn tampered_total_does_not_reconcile() {
        let mut pricing = OrderPricing::compute(&[item(2, 10.0)], 0.0, 0.0, 0.0);
        pricing.total = 1.0;
        assert!(!pricing.reconciles());
    }

    #[test]
    fn status_transitions_are_monotonic() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Completed));
        assert!(!Processing.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Processing));
    }

    #[test]
    fn cancellation_only_from_non_terminal_states() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Processing.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
    }
}
