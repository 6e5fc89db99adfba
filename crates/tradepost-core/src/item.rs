//! Catalog items and their stock.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MarketError, Result};
use crate::user::validate_name;

/// Most fractional digits a price may carry.
pub const PRICE_SCALE: u32 = 2;

/// Longest accepted image reference.
pub const MAX_IMAGE_REF_LEN: usize = 1024;

/// A sellable good with finite stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier for this item.
    pub id: Uuid,

    /// The employee who owns the item. `None` once the owner released it.
    pub employee_id: Option<Uuid>,

    pub name: String,

    pub description: String,

    /// Quantity on hand.
    pub quantity: u32,

    /// Unit price.
    pub price: Decimal,

    /// Opaque reference into the blob store.
    pub image: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Payload for creating or updating an item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDraft {
    pub name: String,
    pub description: String,
    pub quantity: u32,
    pub price: Decimal,
    #[serde(default)]
    pub image: Option<String>,
}

impl ItemDraft {
    /// Validate and normalise the draft.
    pub fn validate(mut self) -> Result<Self> {
        self.name = validate_name(&self.name)?;

        self.description = self.description.trim().to_string();
        if self.description.is_empty() {
            return Err(MarketError::validation("description", "is required"));
        }

        if self.price.is_sign_negative() && !self.price.is_zero() {
            return Err(MarketError::validation("price", "must not be negative"));
        }
        if self.price.normalize().scale() > PRICE_SCALE {
            return Err(MarketError::validation(
                "price",
                format!("must have at most {} decimal places", PRICE_SCALE),
            ));
        }

        if let Some(image) = &self.image {
            let image = image.trim();
            if image.is_empty() || image.len() > MAX_IMAGE_REF_LEN {
                return Err(MarketError::validation("image", "must be a non-empty reference"));
            }
            self.image = Some(image.to_string());
        }

        Ok(self)
    }
}

impl Item {
    /// Create a new item owned by `employee_id`. The draft must already be
    /// validated.
    pub fn new(employee_id: Uuid, draft: ItemDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            employee_id: Some(employee_id),
            name: draft.name,
            description: draft.description,
            quantity: draft.quantity,
            price: draft.price,
            image: draft.image,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the editable fields. The image is only replaced when the
    /// draft carries one.
    pub fn apply_draft(&mut self, draft: ItemDraft) {
        self.name = draft.name;
        self.description = draft.description;
        self.quantity = draft.quantity;
        self.price = draft.price;
        if draft.image.is_some() {
            self.image = draft.image;
        }
        self.updated_at = Utc::now();
    }

    /// Fails with `Forbidden` unless `user_id` owns the item.
    pub fn ensure_owned_by(&self, user_id: Uuid) -> Result<()> {
        if self.employee_id == Some(user_id) {
            Ok(())
        } else {
            Err(MarketError::forbidden("Unauthorized"))
        }
    }

    /// The employee orders for this item are assigned to.
    pub fn assigned_employee(&self) -> Result<Uuid> {
        self.employee_id
            .ok_or_else(|| MarketError::invalid_state("Item does not have an associated employee."))
    }

    /// Decrement stock by `quantity` only if at least that much is on hand.
    pub fn reserve(&mut self, quantity: u32) -> Result<()> {
        match self.quantity.checked_sub(quantity) {
            Some(left) => {
                self.quantity = left;
                self.updated_at = Utc::now();
                Ok(())
            }
            None => Err(MarketError::conflict("Not enough quantity available.")),
        }
    }

    pub fn is_for_sale(&self) -> bool {
        self.quantity > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(quantity: u32, price: Decimal) -> ItemDraft {
        ItemDraft {
            name: "Lamp".to_string(),
            description: "Brass desk lamp".to_string(),
            quantity,
            price,
            image: Some("items/lamp.png".to_string()),
        }
    }

    #[test]
    fn test_reserve_is_conditional() {
        let mut item = Item::new(Uuid::new_v4(), draft(5, Decimal::new(1999, 2)));

        item.reserve(3).unwrap();
        assert_eq!(item.quantity, 2);

        let err = item.reserve(3).unwrap_err();
        assert_eq!(err, MarketError::conflict("Not enough quantity available."));
        assert_eq!(item.quantity, 2);

        item.reserve(2).unwrap();
        assert_eq!(item.quantity, 0);
        assert!(!item.is_for_sale());
    }

    #[test]
    fn test_draft_validation() {
        assert!(draft(1, Decimal::new(1999, 2)).validate().is_ok());
        assert!(draft(0, Decimal::ZERO).validate().is_ok());
        assert!(draft(1, Decimal::new(-1, 0)).validate().is_err());
        assert!(draft(1, Decimal::new(19999, 3)).validate().is_err());
        // trailing zeros do not count as precision
        assert!(draft(1, Decimal::new(19990, 3)).validate().is_ok());

        let mut blank = draft(1, Decimal::ONE);
        blank.description = "   ".to_string();
        assert!(matches!(
            blank.validate(),
            Err(MarketError::Validation { field, .. }) if field == "description"
        ));
    }

    #[test]
    fn test_update_keeps_image_when_absent() {
        let mut item = Item::new(Uuid::new_v4(), draft(5, Decimal::ONE));
        let mut update = draft(7, Decimal::TWO);
        update.image = None;
        item.apply_draft(update);
        assert_eq!(item.quantity, 7);
        assert_eq!(item.image.as_deref(), Some("items/lamp.png"));
    }

    #[test]
    fn test_ownership() {
        let owner = Uuid::new_v4();
        let mut item = Item::new(owner, draft(1, Decimal::ONE));
        assert!(item.ensure_owned_by(owner).is_ok());
        assert!(matches!(
            item.ensure_owned_by(Uuid::new_v4()),
            Err(MarketError::Forbidden { .. })
        ));

        assert_eq!(item.assigned_employee(), Ok(owner));
        item.employee_id = None;
        assert!(matches!(item.assigned_employee(), Err(MarketError::InvalidState { .. })));
    }
}
