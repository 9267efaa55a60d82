//! Resource definitions: named, parameterized document locations.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use crate::errors::ConfigurationError;

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)(\?)?").expect("placeholder regex is valid")
    })
}

/// A resource as declared by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDefinition {
    /// Unique name of the resource.
    pub name: String,
    /// URL template with `:param` / `:param?` placeholders.
    pub url: String,
}

impl ResourceDefinition {
    /// Creates a new resource definition.
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// One placeholder of a resource URL template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceParam {
    /// Placeholder name, without the leading `:` and trailing `?`.
    pub name: String,
    /// Whether the placeholder may be left empty.
    pub optional: bool,
}

/// A normalized resource with its parameters in template order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Unique name of the resource.
    pub name: String,
    /// The raw URL template.
    pub url_template: String,
    /// Parameters in order of first appearance.
    pub params: Vec<ResourceParam>,
}

impl ResourceSpec {
    /// Parses a resource definition's URL template.
    ///
    /// # Errors
    ///
    /// Returns an error if the template is empty.
    pub fn parse(definition: &ResourceDefinition) -> Result<Self, ConfigurationError> {
        if definition.url.trim().is_empty() {
            return Err(ConfigurationError::malformed_template(
                &definition.name,
                &definition.url,
                "the URL template is empty",
            ));
        }

        let mut params: Vec<ResourceParam> = Vec::new();
        for caps in placeholder_regex().captures_iter(&definition.url) {
            let name = caps.get(1).map_or("", |m| m.as_str());
            let optional = caps.get(2).is_some();

            match params.iter_mut().find(|p| p.name == name) {
                // Required wins when a placeholder appears twice.
                Some(existing) => existing.optional &= optional,
                None => params.push(ResourceParam {
                    name: name.to_string(),
                    optional,
                }),
            }
        }

        Ok(Self {
            name: definition.name.clone(),
            url_template: definition.url.clone(),
            params,
        })
    }

    /// Looks up a parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&ResourceParam> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Names of the parameters that must be supplied.
    #[must_use]
    pub fn required_params(&self) -> Vec<&str> {
        self.params
            .iter()
            .filter(|p| !p.optional)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Builds a concrete URL. Placeholders without a value become empty.
    #[must_use]
    pub fn fill_url(&self, args: &HashMap<String, String>) -> String {
        placeholder_regex()
            .replace_all(&self.url_template, |caps: &regex::Captures<'_>| {
                let name = caps.get(1).map_or("", |m| m.as_str());
                args.get(name).cloned().unwrap_or_default()
            })
            .into_owned()
    }
}

/// Arguments passed to a resource reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceArgs {
    /// Bound to the resource's parameters in template order.
    Positional(Vec<String>),
    /// Bound by parameter name.
    Named(Vec<(String, String)>),
}

impl ResourceArgs {
    /// Positional arguments.
    #[must_use]
    pub fn positional<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Positional(args.into_iter().map(Into::into).collect())
    }

    /// Named arguments.
    #[must_use]
    pub fn named<I, K, V>(args: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Named(args.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    fn is_empty(&self) -> bool {
        match self {
            Self::Positional(args) => args.is_empty(),
            Self::Named(args) => args.is_empty(),
        }
    }
}

/// A field's link to a resource: the resource name and one argument
/// template per supplied parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    /// The referenced resource.
    pub name: String,
    /// Parameter name → template that may contain `$variables`.
    pub args: BTreeMap<String, String>,
}

/// Indexed resources, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ResourceTable {
    specs: Vec<ResourceSpec>,
    index: HashMap<String, usize>,
}

impl ResourceTable {
    /// Parses and indexes resource definitions.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed templates or duplicate names.
    pub fn from_definitions(definitions: &[ResourceDefinition]) -> Result<Self, ConfigurationError> {
        let mut table = Self::default();
        for definition in definitions {
            let spec = ResourceSpec::parse(definition)?;
            if table.index.contains_key(&spec.name) {
                return Err(ConfigurationError::duplicate_name(&spec.name));
            }
            table.index.insert(spec.name.clone(), table.specs.len());
            table.specs.push(spec);
        }
        Ok(table)
    }

    /// Looks up a resource by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ResourceSpec> {
        self.index.get(name).map(|&i| &self.specs[i])
    }

    /// Returns true if a resource with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterates resources in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceSpec> {
        self.specs.iter()
    }

    /// Number of resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Returns true if no resources are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Binds arguments to a declared resource.
    ///
    /// # Errors
    ///
    /// Fails if the resource is unknown, if arguments are supplied to a
    /// template without placeholders, or if the arguments do not match the
    /// declared parameters.
    pub fn make_resource_ref(
        &self,
        name: &str,
        args: ResourceArgs,
    ) -> Result<ResourceRef, ConfigurationError> {
        let spec = self
            .get(name)
            .ok_or_else(|| ConfigurationError::unknown_resource(name))?;

        if spec.params.is_empty() && !args.is_empty() {
            return Err(ConfigurationError::malformed_template(
                name,
                &spec.url_template,
                "arguments were supplied but the template declares no placeholders",
            ));
        }

        let bound: BTreeMap<String, String> = match args {
            ResourceArgs::Positional(values) => {
                if values.len() > spec.params.len() {
                    return Err(ConfigurationError::invalid_arguments(
                        name,
                        format!(
                            "takes {} parameter(s) but {} were supplied",
                            spec.params.len(),
                            values.len()
                        ),
                    ));
                }
                spec.params
                    .iter()
                    .zip(values)
                    .map(|(param, value)| (param.name.clone(), value))
                    .collect()
            }
            ResourceArgs::Named(pairs) => {
                if let Some((unknown, _)) = pairs.iter().find(|(k, _)| spec.param(k).is_none()) {
                    return Err(ConfigurationError::invalid_arguments(
                        name,
                        format!("no parameter named \"{unknown}\""),
                    ));
                }
                pairs.into_iter().collect()
            }
        };

        Ok(ResourceRef {
            name: name.to_string(),
            args: bound,
        })
    }

    /// Shorthand for [`make_resource_ref`](Self::make_resource_ref) with
    /// positional arguments.
    ///
    /// # Errors
    ///
    /// See [`make_resource_ref`](Self::make_resource_ref).
    pub fn resource<I, S>(&self, name: &str, args: I) -> Result<ResourceRef, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.make_resource_ref(name, ResourceArgs::positional(args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ResourceTable {
        ResourceTable::from_definitions(&[
            ResourceDefinition::new("itemPage", "https://x/:id"),
            ResourceDefinition::new("search", "https://x/find/:q/:page?"),
            ResourceDefinition::new("home", "https://x/"),
        ])
        .unwrap()
    }

    #[test]
    fn test_parse_params() {
        let t = table();
        let search = t.get("search").unwrap();
        assert_eq!(
            search.params,
            vec![
                ResourceParam { name: "q".into(), optional: false },
                ResourceParam { name: "page".into(), optional: true },
            ]
        );
        assert_eq!(search.required_params(), vec!["q"]);
        assert!(t.get("home").unwrap().params.is_empty());
    }

    #[test]
    fn test_ports_and_schemes_are_not_placeholders() {
        let spec = ResourceSpec::parse(&ResourceDefinition::new(
            "local",
            "http://localhost:8080/items/:id",
        ))
        .unwrap();
        assert_eq!(spec.params.len(), 1);
        assert_eq!(spec.params[0].name, "id");
    }

    #[test]
    fn test_empty_template_is_malformed() {
        let err = ResourceSpec::parse(&ResourceDefinition::new("bad", "  ")).unwrap_err();
        assert_eq!(err.code(), Some("CONFIG-002-MALFORMED_TEMPLATE"));
    }

    #[test]
    fn test_fill_url() {
        let t = table();
        let search = t.get("search").unwrap();

        let mut args = HashMap::new();
        args.insert("q".to_string(), "matrix".to_string());
        assert_eq!(search.fill_url(&args), "https://x/find/matrix/");

        args.insert("page".to_string(), "2".to_string());
        assert_eq!(search.fill_url(&args), "https://x/find/matrix/2");
    }

    #[test]
    fn test_positional_binding_follows_param_order() {
        let r = table().resource("search", ["$title", "$page"]).unwrap();
        assert_eq!(r.name, "search");
        assert_eq!(r.args.get("q"), Some(&"$title".to_string()));
        assert_eq!(r.args.get("page"), Some(&"$page".to_string()));
    }

    #[test]
    fn test_named_binding() {
        let r = table()
            .make_resource_ref("itemPage", ResourceArgs::named([("id", "$id")]))
            .unwrap();
        assert_eq!(r.args.get("id"), Some(&"$id".to_string()));
    }

    #[test]
    fn test_unknown_resource() {
        let err = table().resource("nope", ["$id"]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid resource name 'nope'");
        assert_eq!(err.code(), Some("CONFIG-001-UNKNOWN_RESOURCE"));
    }

    #[test]
    fn test_arguments_to_placeholder_free_template() {
        let err = table().resource("home", ["$id"]).unwrap_err();
        assert_eq!(err.code(), Some("CONFIG-002-MALFORMED_TEMPLATE"));

        assert!(table().resource("home", Vec::<String>::new()).is_ok());
    }

    #[test]
    fn test_argument_mismatch() {
        let err = table().resource("itemPage", ["$a", "$b"]).unwrap_err();
        assert_eq!(err.code(), Some("CONFIG-007-INVALID_ARGUMENTS"));
        let err = table()
            .make_resource_ref("itemPage", ResourceArgs::named([("slug", "$a")]))
            .unwrap_err();
        assert_eq!(err.code(), Some("CONFIG-007-INVALID_ARGUMENTS"));
    }

    #[test]
    fn test_duplicate_resource_names() {
        let err = ResourceTable::from_definitions(&[
            ResourceDefinition::new("page", "https://x/:id"),
            ResourceDefinition::new("page", "https://y/:id"),
        ])
        .unwrap_err();
        assert_eq!(err.code(), Some("CONFIG-004-DUPLICATE_NAME"));
    }
}
