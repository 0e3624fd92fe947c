//! # Pricing Policy
//!
//! The billing price charged at checkout is a policy decision, not a fact of
//! the catalog. Two policies exist because two observed behaviors exist in
//! the field:
//!
//! - **AtCost**: the line is billed at the product's unit *cost*
//!   (break-even / internal-transfer semantics). No discount is recorded.
//! - **DiscountedRetail**: the line is billed at the retail price with the
//!   product's percentage discount applied, and the forgone amount is
//!   recorded as the sale's discount.
//!
//! The policy is chosen once, at service construction, and applies to every
//! line of every checkout. Whichever price is chosen is frozen on the
//! SaleItem at that moment; later catalog changes never touch it.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::money::Money;
use crate::types::Product;

/// Which price a checkout line is billed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingPolicy {
    /// Bill at unit cost; no discount recorded.
    AtCost,
    /// Bill at the discounted retail price; record the discount.
    DiscountedRetail,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        PricingPolicy::DiscountedRetail
    }
}

impl FromStr for PricingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "at_cost" | "cost" => Ok(PricingPolicy::AtCost),
            "discounted_retail" | "retail" => Ok(PricingPolicy::DiscountedRetail),
            other => Err(format!("unknown pricing policy: {other}")),
        }
    }
}

/// The priced view of one cart line unit, before quantity multiplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinePrice {
    /// Unit price to freeze on the SaleItem.
    pub unit_price: Money,
    /// Per-unit discount to accumulate on the sale (zero under AtCost).
    pub unit_discount: Money,
}

impl PricingPolicy {
    /// Prices one unit of a product under this policy.
    pub fn price_unit(&self, product: &Product) -> LinePrice {
        match self {
            PricingPolicy::AtCost => LinePrice {
                unit_price: product.cost(),
                unit_discount: Money::zero(),
            },
            PricingPolicy::DiscountedRetail => {
                let retail = product.price();
                let charged = retail.apply_discount(product.discount_bps);
                LinePrice {
                    unit_price: charged,
                    unit_discount: retail - charged,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Product;
    use chrono::Utc;

    fn product(price_cents: i64, cost_cents: i64, discount_bps: u32) -> Product {
        Product {
            id: "p-1".to_string(),
            name: "Test".to_string(),
            barcode: "0001".to_string(),
            price_cents,
            cost_cents,
            discount_bps,
            stock_quantity: 10,
            category_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_at_cost_bills_cost_without_discount() {
        let p = product(1000, 700, 1000);
        let line = PricingPolicy::AtCost.price_unit(&p);
        assert_eq!(line.unit_price.cents(), 700);
        assert!(line.unit_discount.is_zero());
    }

    #[test]
    fn test_discounted_retail_records_discount() {
        let p = product(1000, 700, 1000); // 10% off 10.00
        let line = PricingPolicy::DiscountedRetail.price_unit(&p);
        assert_eq!(line.unit_price.cents(), 900);
        assert_eq!(line.unit_discount.cents(), 100);
    }

    #[test]
    fn test_no_discount_retail() {
        let p = product(1000, 700, 0);
        let line = PricingPolicy::DiscountedRetail.price_unit(&p);
        assert_eq!(line.unit_price.cents(), 1000);
        assert!(line.unit_discount.is_zero());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "at_cost".parse::<PricingPolicy>().unwrap(),
            PricingPolicy::AtCost
        );
        assert_eq!(
            "DISCOUNTED_RETAIL".parse::<PricingPolicy>().unwrap(),
            PricingPolicy::DiscountedRetail
        );
        assert!("wholesale".parse::<PricingPolicy>().is_err());
    }
}
