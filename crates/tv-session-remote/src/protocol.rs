//! Wire format for reports from the server lifecycle manager.

use serde::{Deserialize, Serialize};

/// Status change reported by the external remote-control server lifecycle
/// manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleReport {
    /// Server is up and reachable at `url`.
    Started { url: String },
    /// Server was stopped on request.
    Stopped,
    /// Server failed to start or crashed.
    Failed { error: String },
}

impl LifecycleReport {
    /// Parse a JSON report.
    ///
    /// # Errors
    /// Returns error if the JSON is malformed or the type is unknown.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_started_report_parses() {
        let report =
            LifecycleReport::from_json(r#"{"type":"started","url":"http://10.0.0.5:12346"}"#)
                .unwrap();
        assert_eq!(
            report,
            LifecycleReport::Started {
                url: "http://10.0.0.5:12346".into()
            }
        );
    }

    #[test]
    fn test_failed_report_serialization() {
        let json = LifecycleReport::Failed {
            error: "port in use".into(),
        }
        .to_json()
        .unwrap();
        assert!(json.contains(r#""type":"failed""#));
        assert!(json.contains("port in use"));
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(LifecycleReport::from_json(r#"{"type":"paused"}"#).is_err());
    }
}
