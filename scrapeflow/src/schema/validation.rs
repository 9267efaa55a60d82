//! Schema validation.
//!
//! Runs once the dependency graph is built and before any item is
//! evaluated, so a bad schema never reaches the network.

use tracing::debug;

use super::IndexedSchema;
use crate::document;
use crate::errors::ConfigurationError;
use crate::template;

/// Rejects schemas that cannot be evaluated.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    /// Validates an indexed schema.
    ///
    /// Checks, in order:
    /// 1. The item selector parses.
    /// 2. Every sourced field supplies all required resource parameters.
    /// 3. Template variables and computed dependencies name values, not
    ///    resources.
    /// 4. Field selectors without variables parse.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(schema: &IndexedSchema) -> Result<(), ConfigurationError> {
        debug!(fields = schema.fields().len(), "Validating schema");

        document::parse_selector(&schema.item_selector).map_err(|reason| {
            ConfigurationError::invalid_selector("item", &schema.item_selector, &reason)
        })?;

        for field in schema.fields() {
            if let Some(source) = &field.source {
                let resource = schema
                    .resources
                    .get(&source.name)
                    .ok_or_else(|| ConfigurationError::unknown_resource(&source.name))?;

                let missing: Vec<String> = resource
                    .required_params()
                    .into_iter()
                    .filter(|param| !source.args.contains_key(*param))
                    .map(str::to_string)
                    .collect();

                if !missing.is_empty() {
                    return Err(ConfigurationError::missing_args(
                        &field.name,
                        &source.name,
                        &missing,
                    ));
                }

                for arg in source.args.values() {
                    Self::check_variables(schema, &field.name, arg)?;
                }
            }

            Self::check_variables(schema, &field.name, &field.selector)?;

            if !template::has_variables(&field.selector) && !field.selector.trim().is_empty() {
                document::parse_selector(&field.selector).map_err(|reason| {
                    ConfigurationError::invalid_selector(&field.name, &field.selector, &reason)
                })?;
            }
        }

        for computed in schema.computed() {
            for dependency in &computed.depends_on {
                Self::check_name(schema, &computed.name, dependency)?;
            }
        }

        Ok(())
    }

    fn check_variables(
        schema: &IndexedSchema,
        owner: &str,
        text: &str,
    ) -> Result<(), ConfigurationError> {
        template::extract_variables(text)
            .iter()
            .try_for_each(|name| Self::check_name(schema, owner, name))
    }

    fn check_name(schema: &IndexedSchema, owner: &str, name: &str) -> Result<(), ConfigurationError> {
        if schema.has_value(name) {
            Ok(())
        } else if schema.resources.contains(name) {
            Err(ConfigurationError::not_a_value(owner, name))
        } else {
            Err(ConfigurationError::unknown_dependency(owner, name))
        }
    }
}
