//! Identifier safety and index naming.
//!
//! Table, column and index names are interpolated into SQL text, so they are
//! restricted to ASCII letters, digits and underscores (not starting with a
//! digit) and always emitted double-quoted.

use sha1::{Digest, Sha1};

use crate::error::{Result, ValidationError};

/// Quote character for identifiers (ANSI SQL, PostgreSQL, SQLite).
pub const IDENTIFIER_QUOTE: char = '"';

/// Prefix of every derived index name.
pub const INDEX_NAME_PREFIX: &str = "idx_";

/// Number of hex digest characters kept in a derived index name.
pub const INDEX_DIGEST_LEN: usize = 16;

/// Returns whether `name` may be used as an identifier in generated SQL.
#[must_use]
pub fn is_safe_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validates and quotes an identifier.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidIdentifier`] if `name` is not a safe
/// identifier.
pub fn quote_identifier(name: &str) -> Result<String> {
    quote_in("identifier", name)
}

/// Same as [`quote_identifier`], reporting `context` on failure.
pub(crate) fn quote_in(context: impl Into<String>, name: &str) -> Result<String> {
    if !is_safe_identifier(name) {
        return Err(ValidationError::InvalidIdentifier {
            context: context.into(),
            name: name.to_string(),
        });
    }
    let quote = IDENTIFIER_QUOTE;
    let escaped = name.replace(quote, &format!("{quote}{quote}"));
    Ok(format!("{quote}{escaped}{quote}"))
}

/// Derives a deterministic index name for `table` over `keys`.
///
/// The table, keys and suffix are lower-cased and the keys sorted, so the
/// result does not depend on the order the caller lists the keys in. The
/// name is `idx_` followed by the first 16 hex characters of the SHA-1 of
/// `table|key1|...|keyN|suffix|`.
#[must_use]
pub fn derive_index_name<S: AsRef<str>>(table: &str, keys: &[S], suffix: &str) -> String {
    let mut sorted: Vec<String> = keys.iter().map(|k| k.as_ref().to_lowercase()).collect();
    sorted.sort();

    let mut hasher = Sha1::new();
    let mut write_part = |part: &str| {
        hasher.update(part.as_bytes());
        hasher.update(b"|");
    };

    write_part(&table.to_lowercase());
    for key in &sorted {
        write_part(key);
    }
    write_part(&suffix.to_lowercase());

    let digest = hex::encode(hasher.finalize());
    format!("{INDEX_NAME_PREFIX}{}", &digest[..INDEX_DIGEST_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_identifiers() {
        for name in ["users", "UserAccounts", "user_records", "user1", "_private"] {
            assert!(is_safe_identifier(name), "{name} should be accepted");
        }
    }

    #[test]
    fn test_unsafe_identifiers() {
        for name in [
            "",
            "1user",
            "user-name",
            "user name",
            "user$",
            "user\"name",
            "naïve",
            "users;--",
        ] {
            assert!(!is_safe_identifier(name), "{name:?} should be rejected");
        }
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("users").unwrap(), "\"users\"");
        assert_eq!(quote_identifier("user_1").unwrap(), "\"user_1\"");
    }

    #[test]
    fn test_quote_identifier_rejects() {
        assert_eq!(
            quote_identifier("1user"),
            Err(ValidationError::InvalidIdentifier {
                context: "identifier".into(),
                name: "1user".into(),
            })
        );
        assert!(quote_identifier("user\"name").is_err());
    }

    #[test]
    fn test_derive_index_name_known_values() {
        assert_eq!(
            derive_index_name("users", &["id"], "hash_idx"),
            "idx_de7ebd7b26552dfc"
        );
        // Unsafe inputs still hash to a safe name.
        assert_eq!(
            derive_index_name("User Accounts", &["Email-Address"], "uniq"),
            "idx_2f4db383e4924ea8"
        );
        assert_eq!(
            derive_index_name("123table", &["id"], "hash_idx"),
            "idx_a61bdf0a335a4148"
        );
    }

    #[test]
    fn test_derive_index_name_ignores_key_order_and_case() {
        let a = derive_index_name("users", &["tenant_id", "email"], "hash_idx");
        let b = derive_index_name("USERS", &["Email", "TENANT_ID"], "hash_idx");
        assert_eq!(a, b);
        assert_eq!(a, "idx_37bf8e184711e239");
    }

    #[test]
    fn test_derive_index_name_varies_with_table_and_suffix() {
        let base = derive_index_name("users", &["id"], "hash_idx");
        assert_eq!(derive_index_name("orders", &["id"], "hash_idx"), "idx_d4a76bfd28eef290");
        assert_eq!(derive_index_name("users", &["id"], "uniq"), "idx_5a94941aee26c156");
        assert_ne!(base, derive_index_name("orders", &["id"], "hash_idx"));
        assert_ne!(base, derive_index_name("users", &["id"], "uniq"));
    }

    #[test]
    fn test_derived_name_is_safe_identifier() {
        let name = derive_index_name("User Accounts", &["Email-Address"], "uniq");
        assert!(is_safe_identifier(&name));
        assert_eq!(name.len(), INDEX_NAME_PREFIX.len() + INDEX_DIGEST_LEN);
    }
}
