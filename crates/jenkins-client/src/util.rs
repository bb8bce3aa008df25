//! Small helpers shared by clients and the command line.

use rand::Rng;
use rand::distr::Alphanumeric;

/// Random alphanumeric password of `len` characters.
pub fn generate_password(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_password_length() {
        assert_eq!(generate_password(3).len(), 3);
        assert_eq!(generate_password(6).len(), 6);
        assert!(generate_password(0).is_empty());
    }

    #[test]
    fn test_generate_password_is_alphanumeric() {
        assert!(generate_password(64).chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
