use std::path::Path;

use serde::Serialize;

use super::ExportError;
use crate::session::Dashboard;

/// Serialize any exportable value to pretty-printed JSON
pub fn export_json<T: Serialize, P: AsRef<Path>>(
    data: &T,
    output_path: P,
) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| ExportError::Serialization(e.to_string()))?;

    std::fs::write(&output_path, json).map_err(|e| ExportError::WriteFailed {
        path: output_path.as_ref().to_path_buf(),
        reason: e.to_string(),
    })
}

/// Export a full dashboard snapshot to JSON
pub fn export_dashboard<P: AsRef<Path>>(
    dashboard: &Dashboard,
    output_path: P,
) -> Result<(), ExportError> {
    export_json(dashboard, output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[derive(Serialize)]
    struct Sample {
        label: String,
        value: f64,
    }

    #[test]
    fn test_export_json() {
        let sample = Sample {
            label: "weekly volume".to_string(),
            value: 42.5,
        };

        let temp_file = NamedTempFile::new().unwrap();
        export_json(&sample, temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("\"label\": \"weekly volume\""));
        assert!(content.contains("\"value\": 42.5"));
    }

    #[test]
    fn test_export_json_unwritable_path() {
        let sample = Sample {
            label: "x".to_string(),
            value: 1.0,
        };

        let result = export_json(&sample, "/nonexistent-dir/out.json");
        assert!(matches!(result, Err(ExportError::WriteFailed { .. })));
    }
}
