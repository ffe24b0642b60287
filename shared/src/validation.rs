//! Validation utilities for the Pour Choices platform
//!
//! Limits mirror the request schemas accepted by the API.

use crate::models::MAX_COLLECTION_NOTES_LEN;

// ============================================================================
// Catalog Validations
// ============================================================================

/// Validate a bottle or distillery name (1-100 characters)
pub fn validate_bottle_name(name: &str) -> Result<(), &'static str> {
    let len = name.trim().chars().count();
    if len == 0 {
        return Err("Name is required");
    }
    if len > 100 {
        return Err("Name must be at most 100 characters");
    }
    Ok(())
}

/// Validate a bottle type label (1-50 characters)
pub fn validate_bottle_type(bottle_type: &str) -> Result<(), &'static str> {
    let len = bottle_type.trim().chars().count();
    if len == 0 {
        return Err("Type is required");
    }
    if len > 50 {
        return Err("Type must be at most 50 characters");
    }
    Ok(())
}

/// Validate a barcode (at most 50 characters, digits only)
pub fn validate_barcode(barcode: &str) -> Result<(), &'static str> {
    if barcode.len() > 50 {
        return Err("Barcode must be at most 50 characters");
    }
    if !barcode.chars().all(|c| c.is_ascii_digit()) {
        return Err("Barcode must contain digits only");
    }
    Ok(())
}

/// Validate an image reference is an http(s) URI
pub fn validate_image_uri(uri: &str) -> Result<(), &'static str> {
    let rest = uri
        .strip_prefix("https://")
        .or_else(|| uri.strip_prefix("http://"))
        .ok_or("Image must be an http or https URI")?;
    if rest.is_empty() || rest.contains(char::is_whitespace) {
        return Err("Image URI is malformed");
    }
    Ok(())
}

/// Validate a catalog search query (1-100 characters)
pub fn validate_search_query(query: &str) -> Result<(), &'static str> {
    let len = query.trim().chars().count();
    if len == 0 {
        return Err("Search query is required");
    }
    if len > 100 {
        return Err("Search query must be at most 100 characters");
    }
    Ok(())
}

// ============================================================================
// Collection Validations
// ============================================================================

/// Validate collection notes length
pub fn validate_collection_notes(notes: &str) -> Result<(), &'static str> {
    if notes.chars().count() > MAX_COLLECTION_NOTES_LEN {
        return Err("Notes must be at most 250 characters");
    }
    Ok(())
}

// ============================================================================
// Account Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && domain.contains('.') && !domain.starts_with('.') =>
        {
            Ok(())
        }
        _ => Err("Invalid email format"),
    }
}

/// Validate username (3-20 alphanumeric characters)
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.len() < 3 {
        return Err("Username must be at least 3 characters");
    }
    if username.len() > 20 {
        return Err("Username must be at most 20 characters");
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err("Username must be alphanumeric only");
    }
    Ok(())
}

/// Validate a US phone number in display format
/// Accepts: +1 (555) 123-4567
pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    let bytes = phone.as_bytes();
    let shape_ok = bytes.len() == 17
        && phone.starts_with("+1 (")
        && bytes[7] == b')'
        && bytes[8] == b' '
        && bytes[12] == b'-';
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    if shape_ok && digits.len() == 11 {
        Ok(())
    } else {
        Err("Phone must look like +1 (555) 123-4567")
    }
}

/// Accept a phone in display form or as bare digits, returning the display
/// form. Blank input means no phone.
pub fn normalize_phone(raw: &str) -> Result<Option<String>, &'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match validate_phone(raw) {
        Ok(()) => Ok(Some(raw.to_string())),
        Err(message) => format_us_phone(raw).map(Some).ok_or(message),
    }
}

/// Format raw phone digits as `+1 (XXX) XXX-XXXX`
pub fn format_us_phone(raw: &str) -> Option<String> {
    let mut digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 11 && digits.starts_with('1') {
        digits.remove(0);
    }
    if digits.len() != 10 {
        return None;
    }
    Some(format!(
        "+1 ({}) {}-{}",
        &digits[0..3],
        &digits[3..6],
        &digits[6..10]
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Catalog Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_bottle_name() {
        assert!(validate_bottle_name("Lagavulin 16").is_ok());
        assert!(validate_bottle_name("   ").is_err());
        assert!(validate_bottle_name(&"a".repeat(100)).is_ok());
        assert!(validate_bottle_name(&"a".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_bottle_type() {
        assert!(validate_bottle_type("Single Malt").is_ok());
        assert!(validate_bottle_type("").is_err());
        assert!(validate_bottle_type(&"t".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_barcode() {
        assert!(validate_barcode("5000281005430").is_ok());
        assert!(validate_barcode("50002-81005").is_err());
        assert!(validate_barcode(&"1".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_image_uri() {
        assert!(validate_image_uri("https://cdn.example.com/a.png").is_ok());
        assert!(validate_image_uri("http://example.com/b.jpg").is_ok());
        assert!(validate_image_uri("ftp://example.com/b.jpg").is_err());
        assert!(validate_image_uri("https://").is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert!(validate_search_query("ardbeg").is_ok());
        assert!(validate_search_query("").is_err());
        assert!(validate_search_query(&"q".repeat(101)).is_err());
    }

    // ========================================================================
    // Collection Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_collection_notes() {
        assert!(validate_collection_notes("").is_ok());
        assert!(validate_collection_notes(&"n".repeat(250)).is_ok());
        assert!(validate_collection_notes(&"n".repeat(251)).is_err());
        // Counted in characters, not bytes
        assert!(validate_collection_notes(&"é".repeat(250)).is_ok());
    }

    // ========================================================================
    // Account Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_email() {
        assert!(validate_email("taster@example.com").is_ok());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("no@domain").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("peatlover").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"u".repeat(21)).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+1 (555) 123-4567").is_ok());
        assert!(validate_phone("555-123-4567").is_err());
        assert!(validate_phone("+1 (555) 1234-567").is_err());
    }

    #[test]
    fn test_format_us_phone() {
        assert_eq!(
            format_us_phone("5551234567").as_deref(),
            Some("+1 (555) 123-4567")
        );
        assert_eq!(
            format_us_phone("1-555-123-4567").as_deref(),
            Some("+1 (555) 123-4567")
        );
        assert_eq!(format_us_phone("12345"), None);
    }
}
