//! Account and catalog input tests
//!
//! Property-based and unit tests for:
//! - Username, email, and phone rules at signup
//! - Bottle submission field limits
//! - Pagination bounds on listing endpoints

use proptest::prelude::*;
use chrono::Utc;
use shared::{
    format_us_phone, normalize_phone, validate_barcode, validate_bottle_name, validate_email,
    validate_phone, validate_search_query, validate_username, Pagination, ProfileEdit, User,
    UserToggles, MAX_PAGE_SIZE,
};
use uuid::Uuid;

fn member() -> User {
    User {
        id: Uuid::new_v4(),
        username: "whiskyfan".to_string(),
        email: "fan@example.com".to_string(),
        phone: Some("+1 (555) 123-4567".to_string()),
        profile_pic: None,
        toggles: UserToggles::default(),
        created_at: Utc::now(),
    }
}

// ============================================================================
// Property Test Strategies
// ============================================================================

fn username_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{3,20}"
}

fn email_strategy() -> impl Strategy<Value = String> {
    "[a-z]{3,10}@[a-z]{3,8}\\.(com|org|net|io)"
}

fn us_digits_strategy() -> impl Strategy<Value = String> {
    "[2-9][0-9]{9}"
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn prop_valid_usernames_accepted(username in username_strategy()) {
        prop_assert!(validate_username(&username).is_ok());
    }

    #[test]
    fn prop_usernames_with_symbols_rejected(
        prefix in "[a-z]{2,8}",
        symbol in "[-_. !@]",
    ) {
        let username = format!("{}{}x", prefix, symbol);
        prop_assert!(validate_username(&username).is_err());
    }

    #[test]
    fn prop_valid_emails_accepted(email in email_strategy()) {
        prop_assert!(validate_email(&email).is_ok());
    }

    #[test]
    fn prop_formatted_phones_validate(digits in us_digits_strategy()) {
        let formatted = format_us_phone(&digits).unwrap();
        prop_assert!(validate_phone(&formatted).is_ok());
        prop_assert_eq!(format_us_phone(&formatted), Some(formatted.clone()));
    }

    #[test]
    fn prop_pagination_is_always_bounded(page in any::<u32>(), limit in any::<u32>()) {
        let pagination = Pagination::new(Some(page), Some(limit));
        prop_assert!(pagination.page >= 1);
        prop_assert!((1..=MAX_PAGE_SIZE).contains(&pagination.limit));
        prop_assert!(pagination.offset() >= 0);
    }

    #[test]
    fn prop_profile_rename_keeps_email(username in username_strategy()) {
        let mut user = member();
        let edit = ProfileEdit {
            username: Some(username.clone()),
            ..ProfileEdit::default()
        };
        prop_assert!(user.apply(&edit).is_ok());
        prop_assert_eq!(user.username, username);
        prop_assert_eq!(user.email, "fan@example.com");
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_username_length_bounds() {
        assert!(validate_username("ab").is_err());
        assert!(validate_username("abc").is_ok());
        assert!(validate_username(&"a".repeat(20)).is_ok());
        assert!(validate_username(&"a".repeat(21)).is_err());
    }

    #[test]
    fn test_phone_display_format() {
        assert!(validate_phone("+1 (555) 123-4567").is_ok());
        assert!(validate_phone("555-123-4567").is_err());
        assert_eq!(
            format_us_phone("1 555 123 4567").as_deref(),
            Some("+1 (555) 123-4567")
        );
        assert_eq!(format_us_phone("12345"), None);
    }

    #[test]
    fn test_search_query_bounds() {
        assert!(validate_search_query("bourbon").is_ok());
        assert!(validate_search_query("").is_err());
        assert!(validate_search_query(&"q".repeat(101)).is_err());
    }

    #[test]
    fn test_bottle_fields() {
        assert!(validate_bottle_name("Blanton's Original").is_ok());
        assert!(validate_barcode("080244009236").is_ok());
        assert!(validate_barcode(&"1".repeat(51)).is_err());
    }

    #[test]
    fn test_last_page_metadata() {
        let meta = Pagination::new(Some(3), Some(20)).meta(45);
        assert_eq!(meta.total_pages, 3);
        assert!(!meta.has_next);
        assert!(meta.has_prev);
    }

    #[test]
    fn test_profile_edit_updates_given_fields() {
        let mut user = member();
        user.apply(&ProfileEdit {
            phone: Some("555 987 6543".to_string()),
            profile_pic: Some("https://img.example.com/me.png".to_string()),
            toggles: Some(UserToggles {
                add_to_home: true,
                stay_logged_in: true,
            }),
            ..ProfileEdit::default()
        })
        .unwrap();
        assert_eq!(user.username, "whiskyfan");
        assert_eq!(user.phone.as_deref(), Some("+1 (555) 987-6543"));
        assert_eq!(user.profile_pic.as_deref(), Some("https://img.example.com/me.png"));
        assert!(user.toggles.stay_logged_in);
    }

    #[test]
    fn test_profile_edit_blank_clears_optional_fields() {
        let mut user = member();
        user.apply(&ProfileEdit {
            phone: Some("  ".to_string()),
            profile_pic: Some(String::new()),
            ..ProfileEdit::default()
        })
        .unwrap();
        assert!(user.phone.is_none());
        assert!(user.profile_pic.is_none());
    }

    #[test]
    fn test_invalid_profile_edit_changes_nothing() {
        let mut user = member();
        let before = user.clone();

        let err = user
            .apply(&ProfileEdit {
                username: Some("bad name!".to_string()),
                phone: Some("555 000 1111".to_string()),
                ..ProfileEdit::default()
            })
            .unwrap_err();
        assert_eq!(err.0, "username");
        assert_eq!(user, before);

        let err = user
            .apply(&ProfileEdit {
                phone: Some("12345".to_string()),
                ..ProfileEdit::default()
            })
            .unwrap_err();
        assert_eq!(err.0, "phone");
        assert_eq!(user, before);
    }

    #[test]
    fn test_profile_edit_from_partial_json() {
        let edit: ProfileEdit =
            serde_json::from_str(r#"{"toggles": {"stay_logged_in": true}}"#).unwrap();
        assert!(edit.username.is_none() && edit.phone.is_none());
        assert_eq!(
            edit.toggles,
            Some(UserToggles {
                add_to_home: false,
                stay_logged_in: true
            })
        );
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone(""), Ok(None));
        assert_eq!(
            normalize_phone("+1 (555) 123-4567"),
            Ok(Some("+1 (555) 123-4567".to_string()))
        );
        assert_eq!(
            normalize_phone("15551234567"),
            Ok(Some("+1 (555) 123-4567".to_string()))
        );
        assert!(normalize_phone("555-1234").is_err());
    }
}
