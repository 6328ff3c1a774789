// ── Core error types ──
//
// Validation errors are raised before any remote call. Remote failures
// keep the underlying `amqpfw_api::Error`: Create and Update wrap it with
// the operation and resource identifier, Read and Delete pass it through.

use thiserror::Error;

/// A rule field failed a local check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid service name {value:?}: expected one of {allowed}")]
    InvalidServiceName { value: String, allowed: String },

    #[error("port {value} out of range: expected {min}..={max}")]
    PortOutOfRange { value: i64, min: i64, max: i64 },

    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },

    #[error("rule {index}: {source}")]
    InRule {
        index: usize,
        source: Box<ValidationError>,
    },
}

impl ValidationError {
    /// Attach the position of the offending rule.
    pub(crate) fn in_rule(self, index: usize) -> Self {
        Self::InRule {
            index,
            source: Box::new(self),
        }
    }

    /// The innermost field error, without rule position wrappers.
    pub fn field_error(&self) -> &Self {
        match self {
            Self::InRule { source, .. } => source.field_error(),
            other => other,
        }
    }
}

/// Unified error type for the lifecycle operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{operation} firewall settings failed for resource {resource_id}: {source}")]
    RemoteOperation {
        operation: &'static str,
        resource_id: String,
        #[source]
        source: amqpfw_api::Error,
    },

    #[error(transparent)]
    Api(#[from] amqpfw_api::Error),

    #[error("invalid resource identifier {}: expected a base-10 instance id", describe_id(.id.as_deref()))]
    IdentifierParse { id: Option<String> },

    #[error("resource identifier {id} does not match instance {instance_id}")]
    IdentifierMismatch { id: String, instance_id: i64 },

    #[error("error setting rules for resource {resource_id}: {source}")]
    InvalidRemoteRules {
        resource_id: String,
        #[source]
        source: ValidationError,
    },
}

impl CoreError {
    /// The API error behind this failure, if it came from the remote side.
    pub fn remote(&self) -> Option<&amqpfw_api::Error> {
        match self {
            Self::RemoteOperation { source, .. } | Self::Api(source) => Some(source),
            _ => None,
        }
    }

    /// Returns `true` if the remote side reported the instance as missing.
    pub fn is_not_found(&self) -> bool {
        self.remote().is_some_and(amqpfw_api::Error::is_not_found)
    }
}

fn describe_id(id: Option<&str>) -> String {
    id.map_or_else(|| "<unset>".into(), |id| format!("{id:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_rule_wraps_and_unwraps() {
        let err = ValidationError::PortOutOfRange {
            value: 70000,
            min: 0,
            max: 65554,
        }
        .in_rule(2);
        assert_eq!(
            err.to_string(),
            "rule 2: port 70000 out of range: expected 0..=65554"
        );
        assert!(matches!(
            err.field_error(),
            ValidationError::PortOutOfRange { value: 70000, .. }
        ));
    }

    #[test]
    fn identifier_parse_message() {
        let missing = CoreError::IdentifierParse { id: None };
        assert!(missing.to_string().contains("<unset>"));

        let bad = CoreError::IdentifierParse {
            id: Some("abc".into()),
        };
        assert!(bad.to_string().contains("\"abc\""));
    }

    #[test]
    fn remote_operation_names_operation_and_resource() {
        let err = CoreError::RemoteOperation {
            operation: "create",
            resource_id: "42".into(),
            source: amqpfw_api::Error::Api {
                status: 400,
                message: "bad ip".into(),
            },
        };
        let msg = err.to_string();
        assert!(msg.starts_with("create firewall settings failed for resource 42"));
        assert!(msg.contains("bad ip"));
        assert_eq!(err.remote().and_then(amqpfw_api::Error::status), Some(400));
    }

    #[test]
    fn not_found_sees_through_wrapping() {
        let err = CoreError::Api(amqpfw_api::Error::NotFound { path: "/x".into() });
        assert!(err.is_not_found());
        assert!(!CoreError::IdentifierParse { id: None }.is_not_found());
    }
}
