use serde::de::DeserializeOwned;

pub mod file_format;
pub mod file_utils;
pub mod log_setup;
pub mod scoped_ref;

pub use file_format::{FileExtensionError, FileFormat};

pub const EPSILON: f64 = 1e-6;

#[derive(Debug, thiserror::Error)]
pub enum SerdeFormatError {
    #[error("YAML deserialization failed: {0}")]
    Yaml(#[from] serde_yml::Error),
    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SerdeFormatResult<T> = Result<T, SerdeFormatError>;

pub fn is_debug() -> bool {
    cfg!(debug_assertions)
}

pub fn deserialize<T: DeserializeOwned>(
    serialized: &str,
    format: FileFormat,
) -> SerdeFormatResult<T> {
    match format {
        FileFormat::Yaml => Ok(serde_yml::from_str(serialized)?),
        FileFormat::Json => Ok(serde_json::from_str(serialized)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize, PartialEq)]
    struct Probe {
        name: String,
        size: f64,
    }

    #[test]
    fn deserialize_yaml_and_json() {
        let yaml: Probe = deserialize("name: leaf\nsize: 0.5\n", FileFormat::Yaml).unwrap();
        let json: Probe = deserialize(r#"{"name": "leaf", "size": 0.5}"#, FileFormat::Json).unwrap();

        assert_eq!(yaml, json);
        assert_eq!(yaml.name, "leaf");
    }

    #[test]
    fn deserialize_reports_format_errors() {
        let err = deserialize::<Probe>("{not json", FileFormat::Json).unwrap_err();
        assert!(matches!(err, SerdeFormatError::Json(_)));
    }
}
