//! # Validation Module
//!
//! Input validation utilities for Corner Shop.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Shell prompt                                                 │
//! │  └── parse_quantity: numeric, positive                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Services and repositories (THIS MODULE + stock checks)       │
//! │  ├── validate_quantity, validate_sale_lines                            │
//! │  └── validate_product before any insert                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE name COLLATE NOCASE                                        │
//! │  ├── CHECK (price_cents >= 0)                                          │
//! │  └── Conditional stock decrement (stock >= qty)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, ValidationError};
use crate::types::{Product, SaleLine};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
///
/// ## Example
/// ```rust
/// use cornershop_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Coffee Maker").is_ok());
/// assert!(validate_product_name("   ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a product category. Same limits as a name, shorter cap.
pub fn validate_category(category: &str) -> ValidationResult<()> {
    let category = category.trim();

    if category.is_empty() {
        return Err(ValidationError::Required {
            field: "category".to_string(),
        });
    }

    if category.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "category".to_string(),
            max: 100,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Parses a quantity typed by the operator.
///
/// ## Example
/// ```rust
/// use cornershop_core::validation::parse_quantity;
///
/// assert_eq!(parse_quantity(" 3 ").unwrap(), 3);
/// assert!(parse_quantity("three").is_err());
/// assert!(parse_quantity("0").is_err());
/// ```
pub fn parse_quantity(input: &str) -> ValidationResult<i64> {
    let qty: i64 = input
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidFormat {
            field: "quantity".to_string(),
            reason: "must be a whole number".to_string(),
        })?;

    validate_quantity(qty)?;
    Ok(qty)
}

/// Validates a quantity value. Any positive whole number is accepted; the
/// only upper bound is the stock on hand, checked separately.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a stock level. Stock may be zero but never negative.
pub fn validate_stock_quantity(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Checks a product record before it is stored.
///
/// ## Example
/// ```rust
/// use cornershop_core::money::Money;
/// use cornershop_core::types::Product;
/// use cornershop_core::validation::validate_product;
///
/// let ok = Product::new("Apple", "Fruits", Money::from_cents(199), 100);
/// assert!(validate_product(&ok).is_ok());
///
/// let negative = Product::new("Apple", "Fruits", Money::from_cents(-1), 100);
/// assert!(validate_product(&negative).is_err());
/// ```
pub fn validate_product(product: &Product) -> ValidationResult<()> {
    validate_product_name(&product.name)?;
    validate_category(&product.category)?;
    validate_price_cents(product.price_cents)?;
    validate_stock_quantity(product.stock_quantity)
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the lines handed to sale creation.
///
/// ## Rules
/// - At least one line
/// - Every quantity passes [`validate_quantity`]
/// - Quantities for the same product (case-insensitive) summed together fit
///   the stock snapshot carried by the lines
pub fn validate_sale_lines(lines: &[SaleLine]) -> Result<(), CoreError> {
    if lines.is_empty() {
        return Err(CoreError::EmptySale);
    }

    for (idx, line) in lines.iter().enumerate() {
        validate_quantity(line.quantity)?;

        let requested: i64 = lines[..=idx]
            .iter()
            .filter(|other| other.product.name.eq_ignore_ascii_case(&line.product.name))
            .map(|other| other.quantity)
            .sum();

        if requested > line.product.stock_quantity {
            return Err(CoreError::InsufficientStock {
                product: line.product.name.clone(),
                available: line.product.stock_quantity,
                requested,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::Product;

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Coffee Maker").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_category() {
        assert!(validate_category("Fruits").is_ok());
        assert!(validate_category(" ").is_err());
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("5").unwrap(), 5);
        assert!(matches!(
            parse_quantity("abc"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            parse_quantity("-2"),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(parse_quantity("2.5").is_err());
        assert_eq!(parse_quantity("1000").unwrap(), 1000);
    }

    #[test]
    fn test_validate_price_and_stock() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(-1).is_err());
        assert!(validate_stock_quantity(0).is_ok());
        assert!(validate_stock_quantity(-1).is_err());
    }

    #[test]
    fn test_validate_product() {
        let apple = Product::new("Apple", "Fruits", Money::from_cents(199), 100);
        assert!(validate_product(&apple).is_ok());

        let free = Product::new("Sample", "Promo", Money::zero(), 0);
        assert!(validate_product(&free).is_ok());

        let mut bad = apple.clone();
        bad.price_cents = -1;
        assert!(matches!(
            validate_product(&bad),
            Err(ValidationError::OutOfRange { ref field, .. }) if field == "price"
        ));

        let mut bad = apple.clone();
        bad.stock_quantity = -5;
        assert!(validate_product(&bad).is_err());

        let mut bad = apple;
        bad.name = "  ".to_string();
        assert!(matches!(
            validate_product(&bad),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_validate_sale_lines() {
        let laptop = Product::new("Laptop", "Electronics", Money::from_cents(99_999), 10);

        assert!(matches!(validate_sale_lines(&[]), Err(CoreError::EmptySale)));
        assert!(validate_sale_lines(&[SaleLine::new(laptop.clone(), 10)]).is_ok());

        let over = validate_sale_lines(&[
            SaleLine::new(laptop.clone(), 6),
            SaleLine::new(laptop.clone(), 5),
        ]);
        assert!(matches!(
            over,
            Err(CoreError::InsufficientStock { requested: 11, available: 10, .. })
        ));
    }

    #[test]
    fn test_large_quantities_only_bounded_by_stock() {
        let apple = Product::new("Apple", "Fruits", Money::from_cents(199), 1500);

        assert!(validate_sale_lines(&[SaleLine::new(apple.clone(), 1200)]).is_ok());
        assert!(validate_sale_lines(&[
            SaleLine::new(apple.clone(), 600),
            SaleLine::new(apple.clone(), 600),
        ])
        .is_ok());
        assert!(matches!(
            validate_sale_lines(&[SaleLine::new(apple, 1501)]),
            Err(CoreError::InsufficientStock { requested: 1501, available: 1500, .. })
        ));
    }
}
