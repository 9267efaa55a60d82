//! Error types for the scrapeflow engine.
//!
//! Configuration and cycle errors are detected while compiling a schema and
//! abort a run before any document is fetched. Transport and extraction
//! errors are raised while evaluating an item and stay scoped to that item.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for scrapeflow operations.
#[derive(Debug, Clone, Error)]
pub enum ScrapeflowError {
    /// The schema is invalid.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),

    /// The schema's dependency graph contains a cycle.
    #[error("{0}")]
    CyclicDependency(#[from] CyclicDependencyError),

    /// A document could not be fetched.
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// A value could not be extracted or computed.
    #[error("{0}")]
    Extraction(#[from] ExtractionError),

    /// A generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScrapeflowError {
    /// Short machine-readable name of the error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "ConfigurationError",
            Self::CyclicDependency(_) => "CyclicDependencyError",
            Self::Transport(_) => "TransportError",
            Self::Extraction(_) => "ExtractionError",
            Self::Internal(_) => "InternalError",
        }
    }

    /// Returns true for errors detected before any I/O happens.
    #[must_use]
    pub fn is_schema_error(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::CyclicDependency(_))
    }
}

/// Metadata about a schema error for better diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "CONFIG-003-MISSING_ARGS").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("code".to_string(), serde_json::Value::String(self.code.clone()));
        map.insert("summary".to_string(), serde_json::Value::String(self.summary.clone()));

        if let Some(ref hint) = self.fix_hint {
            map.insert("fix_hint".to_string(), serde_json::Value::String(hint.clone()));
        }
        if !self.context.is_empty() {
            let context_map: serde_json::Map<String, serde_json::Value> = self
                .context
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            map.insert("context".to_string(), serde_json::Value::Object(context_map));
        }

        map
    }
}

/// Error raised when a schema is rejected while indexing or validating it.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ConfigurationError {
    /// The error message.
    pub message: String,
    /// Names of the schema entries involved.
    pub names: Vec<String>,
    /// Optional structured diagnostics.
    pub error_info: Option<ContractErrorInfo>,
}

impl ConfigurationError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            names: Vec::new(),
            error_info: None,
        }
    }

    /// Sets the schema entries involved.
    #[must_use]
    pub fn with_names(mut self, names: Vec<String>) -> Self {
        self.names = names;
        self
    }

    /// Sets the structured diagnostics.
    #[must_use]
    pub fn with_error_info(mut self, info: ContractErrorInfo) -> Self {
        self.error_info = Some(info);
        self
    }

    /// Returns the diagnostic code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.error_info.as_ref().map(|info| info.code.as_str())
    }

    /// A field referenced a resource that was never declared.
    #[must_use]
    pub fn unknown_resource(name: &str) -> Self {
        Self::new(format!("Invalid resource name '{name}'"))
            .with_names(vec![name.to_string()])
            .with_error_info(
                ContractErrorInfo::new(
                    "CONFIG-001-UNKNOWN_RESOURCE",
                    format!("Resource '{name}' is not declared"),
                )
                .with_fix_hint("Declare the resource under `resources` or fix the name."),
            )
    }

    /// A resource URL template cannot serve the way it is used.
    #[must_use]
    pub fn malformed_template(resource: &str, template: &str, reason: &str) -> Self {
        Self::new(format!(
            "Malformed URL template for resource \"{resource}\" ({template}): {reason}"
        ))
        .with_names(vec![resource.to_string()])
        .with_error_info(
            ContractErrorInfo::new(
                "CONFIG-002-MALFORMED_TEMPLATE",
                format!("URL template of '{resource}' is malformed"),
            )
            .with_context_entry("template", template)
            .with_fix_hint("Use `:name` placeholders, e.g. https://example.com/title/:id"),
        )
    }

    /// Arguments passed to a resource do not match its declared parameters.
    #[must_use]
    pub fn invalid_arguments(resource: &str, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::new(format!("Invalid arguments for resource \"{resource}\": {reason}"))
            .with_names(vec![resource.to_string()])
            .with_error_info(ContractErrorInfo::new("CONFIG-007-INVALID_ARGUMENTS", reason))
    }

    /// A sourced field omits required resource parameters.
    #[must_use]
    pub fn missing_args(field: &str, resource: &str, missing: &[String]) -> Self {
        let joined = missing.join(", ");
        let mut names = vec![field.to_string(), resource.to_string()];
        names.extend(missing.iter().cloned());

        Self::new(format!(
            "Missing required arguments for resource \"{resource}\" in field \"{field}\": {joined}"
        ))
        .with_names(names)
        .with_error_info(
            ContractErrorInfo::new(
                "CONFIG-003-MISSING_ARGS",
                format!("Field '{field}' does not supply {joined}"),
            )
            .with_context_entry("field", field)
            .with_context_entry("resource", resource)
            .with_fix_hint("Pass every non-optional placeholder of the resource URL."),
        )
    }

    /// A name is declared more than once across resources, fields and computed.
    #[must_use]
    pub fn duplicate_name(name: &str) -> Self {
        Self::new(format!("Name \"{name}\" is declared more than once"))
            .with_names(vec![name.to_string()])
            .with_error_info(
                ContractErrorInfo::new(
                    "CONFIG-004-DUPLICATE_NAME",
                    format!("'{name}' is not unique"),
                )
                .with_fix_hint("Resources, fields and computed values share one namespace."),
            )
    }

    /// A node depends on a name that is not part of the schema.
    #[must_use]
    pub fn unknown_dependency(node: &str, dependency: &str) -> Self {
        Self::new(format!("\"{node}\" depends on unknown name \"{dependency}\""))
            .with_names(vec![node.to_string(), dependency.to_string()])
            .with_error_info(
                ContractErrorInfo::new(
                    "CONFIG-005-UNKNOWN_DEPENDENCY",
                    format!("Dependency '{dependency}' not found"),
                )
                .with_fix_hint("Check for typos in `$name` references and `depends_on` lists."),
            )
    }

    /// A template variable names something that does not carry a value.
    #[must_use]
    pub fn not_a_value(node: &str, variable: &str) -> Self {
        Self::new(format!(
            "\"{node}\" references \"${variable}\", which is a resource and has no value"
        ))
        .with_names(vec![node.to_string(), variable.to_string()])
        .with_error_info(ContractErrorInfo::new(
            "CONFIG-008-NOT_A_VALUE",
            format!("'{variable}' is not a field or computed value"),
        ))
    }

    /// A configuration value is outside its accepted range.
    #[must_use]
    pub fn invalid_value(key: &str, reason: &str) -> Self {
        Self::new(format!("Invalid value for \"{key}\": {reason}"))
            .with_names(vec![key.to_string()])
            .with_error_info(
                ContractErrorInfo::new("CONFIG-009-INVALID_VALUE", format!("'{key}' {reason}"))
                    .with_context_entry("key", key),
            )
    }

    /// A selector cannot be parsed by the document engine.
    #[must_use]
    pub fn invalid_selector(owner: &str, selector: &str, reason: &str) -> Self {
        Self::new(format!("Invalid selector for \"{owner}\" ({selector}): {reason}"))
            .with_names(vec![owner.to_string()])
            .with_error_info(
                ContractErrorInfo::new(
                    "CONFIG-006-INVALID_SELECTOR",
                    format!("Selector of '{owner}' does not parse"),
                )
                .with_context_entry("selector", selector),
            )
    }
}

/// Error raised when the dependency graph contains a cycle.
#[derive(Debug, Clone, Error)]
#[error("Cyclic dependency discovered: \"{node}\"")]
pub struct CyclicDependencyError {
    /// The node at which the cycle was detected.
    pub node: String,
    /// Structured diagnostics.
    pub error_info: ContractErrorInfo,
}

impl CyclicDependencyError {
    /// Creates a new cyclic dependency error.
    #[must_use]
    pub fn new(node: impl Into<String>) -> Self {
        let node = node.into();
        let info = ContractErrorInfo::new(
            "GRAPH-001-CYCLE",
            format!("'{node}' transitively depends on itself"),
        )
        .with_fix_hint("Remove one of the `$name` references or `depends_on` entries in the cycle.");

        Self {
            node,
            error_info: info,
        }
    }
}

/// Error raised when a document cannot be fetched.
#[derive(Debug, Clone, Error)]
#[error("Failed to fetch {url}: {message}")]
pub struct TransportError {
    /// The URL that was requested.
    pub url: String,
    /// Description of the failure.
    pub message: String,
    /// HTTP status, when the server answered.
    pub status: Option<u16>,
}

impl TransportError {
    /// Creates a new transport error.
    #[must_use]
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Sets the HTTP status.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// Error returned by collectors, filters and computed handlers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct CollectError(pub String);

impl CollectError {
    /// Creates a new collect error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors raised while evaluating a single item.
#[derive(Debug, Clone, Error)]
pub enum ExtractionError {
    /// A template referenced a name outside the field and computed namespaces.
    #[error("Unknown variable \"{name}\"")]
    UnknownVariable {
        /// The variable name.
        name: String,
    },

    /// A template referenced a value that has not been produced yet.
    #[error("Variable \"{name}\" has no value yet")]
    UnsetValue {
        /// The variable name.
        name: String,
    },

    /// A selector built from a template could not be parsed.
    #[error("Invalid selector for field \"{field}\" ({selector}): {reason}")]
    InvalidSelector {
        /// The field name.
        field: String,
        /// The substituted selector.
        selector: String,
        /// The parser's complaint.
        reason: String,
    },

    /// A field's collector or filter failed.
    #[error("Collector for field \"{field}\" failed: {source}")]
    Collector {
        /// The field name.
        field: String,
        /// The underlying failure.
        source: CollectError,
    },

    /// A computed handler failed.
    #[error("Handler for computed \"{computed}\" failed: {source}")]
    Handler {
        /// The computed name.
        computed: String,
        /// The underlying failure.
        source: CollectError,
    },

    /// The evaluation plan references a spec that does not exist.
    #[error("Found no handler for the {kind} named \"{name}\"")]
    MissingSpec {
        /// Node kind.
        kind: String,
        /// Node name.
        name: String,
    },
}

impl ExtractionError {
    /// Creates an unknown variable error.
    #[must_use]
    pub fn unknown_variable(name: impl Into<String>) -> Self {
        Self::UnknownVariable { name: name.into() }
    }

    /// Creates a collector failure for a field.
    #[must_use]
    pub fn collector(field: impl Into<String>, source: CollectError) -> Self {
        Self::Collector {
            field: field.into(),
            source,
        }
    }

    /// Creates a handler failure for a computed value.
    #[must_use]
    pub fn handler(computed: impl Into<String>, source: CollectError) -> Self {
        Self::Handler {
            computed: computed.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_error_info_creation() {
        let info = ContractErrorInfo::new("TEST-001", "Test error")
            .with_fix_hint("Fix this by doing that")
            .with_context_entry("field", "title");

        assert_eq!(info.code, "TEST-001");
        assert_eq!(info.fix_hint, Some("Fix this by doing that".to_string()));
        assert_eq!(info.context.get("field"), Some(&"title".to_string()));

        let dict = info.to_dict();
        assert_eq!(dict.get("code").unwrap(), "TEST-001");
        assert!(dict.contains_key("context"));
    }

    #[test]
    fn test_missing_args_message() {
        let err = ConfigurationError::missing_args(
            "description",
            "itemPage",
            &["id".to_string(), "lang".to_string()],
        );

        assert_eq!(
            err.to_string(),
            "Missing required arguments for resource \"itemPage\" in field \"description\": id, lang"
        );
        assert_eq!(err.code(), Some("CONFIG-003-MISSING_ARGS"));
        assert_eq!(err.names, vec!["description", "itemPage", "id", "lang"]);
    }

    #[test]
    fn test_configuration_codes_are_distinct() {
        let errors = [
            ConfigurationError::unknown_resource("itemPage"),
            ConfigurationError::malformed_template("itemPage", "https://x/:", "empty placeholder"),
            ConfigurationError::missing_args("description", "itemPage", &["id".to_string()]),
            ConfigurationError::duplicate_name("id"),
            ConfigurationError::unknown_dependency("id", "nope"),
            ConfigurationError::invalid_selector("title", "a[", "unexpected end"),
            ConfigurationError::invalid_arguments("itemPage", "unexpected argument \"lang\""),
            ConfigurationError::not_a_value("id", "itemPage"),
            ConfigurationError::invalid_value("fetch.timeout_seconds", "must be positive"),
        ];

        let mut codes: Vec<&str> = errors.iter().filter_map(ConfigurationError::code).collect();
        assert_eq!(codes.len(), errors.len());
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());

        assert_eq!(errors[6].code(), Some("CONFIG-007-INVALID_ARGUMENTS"));
        assert_eq!(errors[7].code(), Some("CONFIG-008-NOT_A_VALUE"));
        assert_eq!(
            errors[8].to_string(),
            "Invalid value for \"fetch.timeout_seconds\": must be positive"
        );
    }

    #[test]
    fn test_cyclic_dependency_error() {
        let err = CyclicDependencyError::new("id");
        assert_eq!(err.to_string(), "Cyclic dependency discovered: \"id\"");
        assert_eq!(err.error_info.code, "GRAPH-001-CYCLE");
    }

    #[test]
    fn test_error_kinds() {
        let config: ScrapeflowError = ConfigurationError::unknown_resource("x").into();
        assert_eq!(config.kind(), "ConfigurationError");
        assert!(config.is_schema_error());

        let transport: ScrapeflowError = TransportError::new("https://x", "boom").with_status(503).into();
        assert_eq!(transport.kind(), "TransportError");
        assert!(!transport.is_schema_error());
        assert_eq!(transport.to_string(), "Failed to fetch https://x: boom");
    }

    #[test]
    fn test_extraction_error_messages() {
        let err = ExtractionError::collector("title", CollectError::new("no text"));
        assert_eq!(err.to_string(), "Collector for field \"title\" failed: no text");

        let err = ExtractionError::unknown_variable("nope");
        assert_eq!(err.to_string(), "Unknown variable \"nope\"");
    }
}
