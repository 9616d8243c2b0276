use chrono::Utc;
use uuid::Uuid;

/// Length of the random suffix appended to generated identifiers
const SUFFIX_LENGTH: usize = 9;

/// Generates an identifier of the shape `{prefix}-{epoch-millis}-{9-char random suffix}`
///
/// The suffix is drawn from a v4 UUID, so it is lowercase alphanumeric.
pub fn generate_id(prefix: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(SUFFIX_LENGTH)
        .collect();
    format!("{}-{}-{}", prefix, millis, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_shape() {
        let id = generate_id("scan");
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "scan");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), SUFFIX_LENGTH);
        assert!(parts[2].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generate_id_unique() {
        let a = generate_id("webhook");
        let b = generate_id("webhook");
        assert_ne!(a, b);
    }
}
