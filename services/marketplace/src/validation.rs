//! Input validation utilities

use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;

pub const MAX_PRODUCT_IMAGES: usize = 4;

/// Largest quantity a single cart line may hold
pub const MAX_LINE_QUANTITY: i64 = 10_000;

/// Largest price the `NUMERIC(12, 2)` column holds
pub const MAX_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Largest order total the `NUMERIC(14, 2)` column holds
pub const MAX_ORDER_TOTAL: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

/// Longest search query accepted
pub const MAX_QUERY_LENGTH: usize = 100;

/// Validate username: 8-15 letters or digits
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9]{8,15}$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err(format!(
            "{username} is not a valid username. It should contain only letters and digits, and be 8-15 characters long"
        ));
    }

    Ok(())
}

/// Validate password: 8-20 characters drawn from letters, digits and `!@#$%^&*`,
/// with at least one of each class
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    let length = password.chars().count();
    if !(8..=20).contains(&length) {
        return Err("Password must be 8-20 characters long".to_string());
    }

    let mut has_upper = false;
    let mut has_lower = false;
    let mut has_digit = false;
    let mut has_special = false;

    for c in password.chars() {
        if c.is_ascii_uppercase() {
            has_upper = true;
        } else if c.is_ascii_lowercase() {
            has_lower = true;
        } else if c.is_ascii_digit() {
            has_digit = true;
        } else if "!@#$%^&*".contains(c) {
            has_special = true;
        } else {
            return Err(format!("Password must not contain {c:?}"));
        }
    }

    if !has_upper {
        return Err("Password must contain at least one uppercase letter".to_string());
    }

    if !has_lower {
        return Err("Password must contain at least one lowercase letter".to_string());
    }

    if !has_digit {
        return Err("Password must contain at least one digit".to_string());
    }

    if !has_special {
        return Err("Password must contain at least one special character (!@#$%^&*)".to_string());
    }

    Ok(())
}

/// Validate a display name or address; returns the trimmed value
pub fn validate_profile_field(label: &str, value: Option<&str>) -> Result<String, String> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(format!("{label} is required"));
    }
    if value.chars().count() < 5 {
        return Err(format!("{label} must be at least 5 characters long"));
    }
    Ok(value.to_string())
}

/// Validate product name: 10-20 characters after trimming
pub fn validate_product_name(name: &str) -> Result<String, String> {
    let name = name.trim();
    let length = name.chars().count();
    if !(10..=20).contains(&length) {
        return Err("Product name must be 10-20 characters long".to_string());
    }
    Ok(name.to_string())
}

/// Validate price: whole cents between 0 and [`MAX_PRICE`]
pub fn validate_price(price: Decimal) -> Result<(), String> {
    if price < Decimal::ZERO {
        return Err("Price must not be negative".to_string());
    }
    if price > MAX_PRICE {
        return Err(format!("Price must not exceed {MAX_PRICE}"));
    }
    if price.normalize().scale() > 2 {
        return Err("Price must not have more than two decimal places".to_string());
    }
    Ok(())
}

/// Validate a requested quantity: positive and at most [`MAX_LINE_QUANTITY`]
pub fn validate_quantity(quantity: i64) -> Result<(), String> {
    if quantity <= 0 {
        return Err("Quantity must be a positive number".to_string());
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err(format!("Quantity must not exceed {MAX_LINE_QUANTITY}"));
    }
    Ok(())
}

/// Validate a search query; returns it trimmed
pub fn validate_search_query(query: &str) -> Result<&str, String> {
    let query = query.trim();
    if query.chars().count() > MAX_QUERY_LENGTH {
        return Err(format!(
            "Search query must be at most {MAX_QUERY_LENGTH} characters long"
        ));
    }
    Ok(query)
}

/// Validate description: at most 500 characters; blank means none
pub fn validate_description(description: Option<&str>) -> Result<Option<String>, String> {
    let Some(description) = description.map(str::trim) else {
        return Ok(None);
    };
    if description.is_empty() {
        return Ok(None);
    }
    if description.chars().count() > 500 {
        return Err("Description must be at most 500 characters long".to_string());
    }
    Ok(Some(description.to_string()))
}

/// Validate a stored upload filename: a bare file name, no directories
pub fn validate_image_name(name: &str) -> Result<(), String> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control)
    {
        return Err(format!("{name:?} is not a valid image file name"));
    }
    Ok(())
}

/// Validate the image list of a product: 1-4 distinct file names
pub fn validate_product_images(images: &[String]) -> Result<(), String> {
    if images.is_empty() || images.len() > MAX_PRODUCT_IMAGES {
        return Err(format!(
            "A product needs between 1 and {MAX_PRODUCT_IMAGES} images"
        ));
    }
    for (index, image) in images.iter().enumerate() {
        validate_image_name(image)?;
        if images[..index].contains(image) {
            return Err(format!("Image {image:?} is listed twice"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(validate_username("customer01").is_ok());
        assert!(validate_username("abcdefgh").is_ok());
        assert!(validate_username("abcdefghijklmno").is_ok());
        assert!(validate_username("short1").is_err());
        assert!(validate_username("abcdefghijklmnop").is_err());
        assert!(validate_username("with_underscore").is_err());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("Passw0rd!").is_ok());
        assert!(validate_password("Pw0!").is_err());
        assert!(validate_password("Passw0rd!Passw0rd!xyz").is_err());
        assert!(validate_password("password0!").is_err());
        assert!(validate_password("PASSWORD0!").is_err());
        assert!(validate_password("Password!!").is_err());
        assert!(validate_password("Password00").is_err());
        assert!(validate_password("Passw0rd!?").is_err());
    }

    #[test]
    fn profile_fields_are_trimmed_and_bounded() {
        assert_eq!(
            validate_profile_field("Name", Some("  Tran Anh  ")).unwrap(),
            "Tran Anh"
        );
        assert!(validate_profile_field("Name", Some("Tran")).is_err());
        assert!(validate_profile_field("Address", None).is_err());
    }

    #[test]
    fn product_rules() {
        assert_eq!(
            validate_product_name("  Bamboo lamp XL ").unwrap(),
            "Bamboo lamp XL"
        );
        assert!(validate_product_name("Lamp").is_err());
        assert!(validate_product_name("A very long product name").is_err());

        assert_eq!(validate_description(Some("   ")).unwrap(), None);
        assert!(validate_description(Some(&"x".repeat(501))).is_err());
    }

    #[test]
    fn prices_must_fit_the_stored_column() {
        assert!(validate_price(Decimal::ZERO).is_ok());
        assert!(validate_price("19.99".parse().unwrap()).is_ok());
        assert!(validate_price("1.500".parse().unwrap()).is_ok());
        assert!(validate_price("9999999999.99".parse().unwrap()).is_ok());
        assert_eq!(MAX_PRICE.to_string(), "9999999999.99");
        assert_eq!(MAX_ORDER_TOTAL.to_string(), "999999999999.99");

        assert!(validate_price(Decimal::new(-1, 2)).is_err());
        assert!(validate_price("0.125".parse().unwrap()).is_err());
        assert!(validate_price("10000000000".parse().unwrap()).is_err());
    }

    #[test]
    fn quantities_are_positive_and_capped() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
        assert!(validate_quantity(i64::MAX).is_err());
    }

    #[test]
    fn search_queries_are_trimmed_and_bounded() {
        assert_eq!(validate_search_query("  lamp ").unwrap(), "lamp");
        assert!(validate_search_query(&"a".repeat(MAX_QUERY_LENGTH)).is_ok());
        assert!(validate_search_query(&"ab".repeat(50_000)).is_err());
    }

    #[test]
    fn image_list_rules() {
        let one = vec!["a.jpg".to_string()];
        assert!(validate_product_images(&one).is_ok());
        assert!(validate_product_images(&[]).is_err());

        let five: Vec<String> = (0..5).map(|i| format!("{i}.jpg")).collect();
        assert!(validate_product_images(&five).is_err());

        let twice = vec!["a.jpg".to_string(), "a.jpg".to_string()];
        assert!(validate_product_images(&twice).is_err());

        let escaping = vec!["../etc/passwd".to_string()];
        assert!(validate_product_images(&escaping).is_err());
    }
}
