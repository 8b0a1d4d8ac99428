use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::security::Secret;
use std::fs;
use std::path::Path;
use tracing::info;

/// 读取持久化的密钥，不存在时生成并写入
pub fn load_or_create(path: &Path) -> DomainResult<Secret> {
    if path.exists() {
        let content = fs::read_to_string(path).map_err(|e| {
            DomainError::ConfigurationError(format!(
                "Failed to read secret file {}: {}",
                path.display(),
                e
            ))
        })?;
        let secret = Secret::new(content.trim());
        if !secret.is_empty() {
            return Ok(secret);
        }
    }

    let secret = Secret::generate();
    fs::write(path, secret.expose()).map_err(|e| {
        DomainError::ConfigurationError(format!(
            "Failed to write secret file {}: {}",
            path.display(),
            e
        ))
    })?;
    info!("Generated new gateway secret at {}", path.display());

    Ok(secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_is_generated_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret");

        let first = load_or_create(&path).unwrap();
        let second = load_or_create(&path).unwrap();

        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_existing_secret_is_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret");
        fs::write(&path, "  MySecret-42\n").unwrap();

        let secret = load_or_create(&path).unwrap();

        assert_eq!(secret.expose(), "mysecret-42");
    }

    #[test]
    fn test_empty_secret_file_is_regenerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret");
        fs::write(&path, "\n").unwrap();

        let secret = load_or_create(&path).unwrap();

        assert_eq!(secret.expose().len(), 40);
        assert_eq!(fs::read_to_string(&path).unwrap(), secret.expose());
    }
}
