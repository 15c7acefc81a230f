use uuid::Uuid;

/// Random UUID v4, optionally as `<prefix>_<uuid>`
pub fn generate_unique_id(prefix: &str) -> String {
    let unique_id = Uuid::new_v4();
    if prefix.is_empty() {
        unique_id.to_string()
    } else {
        format!("{}_{}", prefix, unique_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unique_id_without_prefix() {
        let id = generate_unique_id("");
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_generate_unique_id_with_prefix() {
        let id = generate_unique_id("req");
        let (prefix, rest) = id.split_once('_').unwrap();
        assert_eq!(prefix, "req");
        assert!(Uuid::parse_str(rest).is_ok());
    }

    #[test]
    fn test_generate_unique_id_is_unique() {
        assert_ne!(generate_unique_id("req"), generate_unique_id("req"));
    }
}
