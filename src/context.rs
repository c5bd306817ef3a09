//! Context store - named environments of template variables

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::constants::DEFAULT_ENVIRONMENT;
use crate::models::null_as_default;

/// A single variable of an environment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextVariable {
    #[serde(rename = "Variable")]
    pub variable: String,
    #[serde(rename = "Value")]
    pub value: String,
}

impl ContextVariable {
    pub fn new(variable: impl Into<String>, value: impl Into<String>) -> Self {
        ContextVariable {
            variable: variable.into(),
            value: value.into(),
        }
    }
}

/// Environments (lowercase names) and their variables.
///
/// Environment names are lowercased on every call. Variable names keep their case.
/// Absent environments and variables are never an error, only empty results.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    #[serde(rename = "Env", default, deserialize_with = "null_as_default")]
    env: BTreeMap<String, Vec<ContextVariable>>,
}

fn normalize(env: &str) -> String {
    env.to_lowercase()
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// All environment names, sorted, with `default` always present
    pub fn list_environments(&self) -> Vec<String> {
        let mut names: Vec<String> = self.env.keys().map(|k| normalize(k)).collect();
        if !names.iter().any(|n| n == DEFAULT_ENVIRONMENT) {
            names.push(DEFAULT_ENVIRONMENT.to_string());
        }
        names.sort();
        names.dedup();
        names
    }

    /// Insert or overwrite `variable` in `env`, creating the environment if needed
    pub fn add(&mut self, env: &str, variable: &str, value: &str) {
        let vars = self.env.entry(normalize(env)).or_default();
        vars.retain(|v| v.variable != variable);
        vars.insert(0, ContextVariable::new(variable, value));
    }

    /// Remove `variable` from `env`. An emptied environment other than `default` is dropped.
    pub fn remove(&mut self, env: &str, variable: &str) {
        let env = normalize(env);
        let emptied = match self.env.get_mut(&env) {
            Some(vars) => {
                vars.retain(|v| v.variable != variable);
                vars.is_empty()
            }
            None => return,
        };
        if emptied && env != DEFAULT_ENVIRONMENT {
            self.env.remove(&env);
        }
    }

    pub fn variables(&self, env: &str) -> &[ContextVariable] {
        self.env
            .get(&normalize(env))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn all_variable_names(&self, env: &str) -> Vec<String> {
        self.variables(env)
            .iter()
            .map(|v| v.variable.clone())
            .collect()
    }

    /// Flat variable -> value map used for substitution
    pub fn all_key_values(&self, env: &str) -> HashMap<String, String> {
        self.variables(env)
            .iter()
            .map(|v| (v.variable.clone(), v.value.clone()))
            .collect()
    }

    pub fn find(&self, env: &str, variable: &str) -> Option<&ContextVariable> {
        self.variables(env).iter().find(|v| v.variable == variable)
    }

    /// Whether the environment exists in the underlying map (`default` may be synthesized)
    pub fn contains_environment(&self, env: &str) -> bool {
        self.env.contains_key(&normalize(env))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_environments_empty_context() {
        let ctx = Context::new();
        assert_eq!(ctx.list_environments(), vec!["default"]);
    }

    #[test]
    fn test_list_environments_sorted() {
        let mut ctx = Context::new();
        ctx.add("prod", "{prod}", "prod-value");
        ctx.add("dev", "{dev}", "dev-value");

        assert_eq!(ctx.list_environments(), vec!["default", "dev", "prod"]);
    }

    #[test]
    fn test_list_environments_sorts_default_with_the_others() {
        let mut ctx = Context::new();
        ctx.add("alpha", "{a}", "1");
        ctx.add("zulu", "{z}", "2");

        assert_eq!(ctx.list_environments(), vec!["alpha", "default", "zulu"]);
    }

    #[test]
    fn test_add_from_empty_context() {
        let mut ctx = Context::new();
        ctx.add("dev", "{dev}", "dev-value");

        assert_eq!(
            ctx.find("dev", "{dev}"),
            Some(&ContextVariable::new("{dev}", "dev-value"))
        );
    }

    #[test]
    fn test_add_normalizes_environment_only() {
        let mut ctx = Context::new();
        ctx.add("DEV", "{X}", "v");

        assert!(ctx.find("dev", "{X}").is_some());
        assert_eq!(ctx.find("Dev", "{X}"), ctx.find("dev", "{X}"));
        assert!(ctx.find("dev", "{x}").is_none());
        assert_eq!(ctx.list_environments(), vec!["default", "dev"]);
    }

    #[test]
    fn test_add_overwrites_same_variable() {
        let mut ctx = Context::new();
        ctx.add("dev", "{host}", "one");
        ctx.add("dev", "{host}", "two");

        assert_eq!(ctx.variables("dev").len(), 1);
        assert_eq!(ctx.find("dev", "{host}").unwrap().value, "two");
    }

    #[test]
    fn test_add_several_environments() {
        let mut ctx = Context::new();
        ctx.add("dev", "{dev-1}", "dev-1-value");
        ctx.add("default", "{default}", "default-value");
        ctx.add("dev", "{dev-2}", "dev-2-value");
        ctx.add("prod", "{prod}", "prod-value");

        assert_eq!(ctx.variables("dev").len(), 2);
        assert_eq!(ctx.variables("default").len(), 1);
        assert_eq!(ctx.variables("prod").len(), 1);
    }

    #[test]
    fn test_remove_missing_environment_is_noop() {
        let mut ctx = Context::new();
        ctx.remove("dev", "{dev-1}");
        assert_eq!(ctx, Context::new());
    }

    #[test]
    fn test_remove_keeps_other_variables() {
        let mut ctx = Context::new();
        ctx.add("dev", "{dev-1}", "dev-1-value");
        ctx.add("dev", "{dev-2}", "dev-2-value");

        ctx.remove("dev", "{dev-2}");

        assert_eq!(ctx.all_variable_names("dev"), vec!["{dev-1}"]);
    }

    #[test]
    fn test_remove_last_variable_drops_environment() {
        let mut ctx = Context::new();
        ctx.add("qa", "{q}", "1");
        ctx.remove("QA", "{q}");

        assert!(!ctx.contains_environment("qa"));
        assert_eq!(ctx.list_environments(), vec!["default"]);
    }

    #[test]
    fn test_remove_last_default_variable_keeps_default() {
        let mut ctx = Context::new();
        ctx.add("default", "{d}", "1");
        ctx.remove("default", "{d}");

        assert!(ctx.contains_environment("default"));
        assert_eq!(ctx.list_environments(), vec!["default"]);
    }

    #[test]
    fn test_all_variable_names() {
        let mut ctx = Context::new();
        ctx.add("dev", "{dev-1}", "dev-1-value");
        ctx.add("dev", "{dev-2}", "dev-2-value");

        let mut names = ctx.all_variable_names("dev");
        names.sort();
        assert_eq!(names, vec!["{dev-1}", "{dev-2}"]);
        assert!(ctx.all_variable_names("missing").is_empty());
    }

    #[test]
    fn test_all_key_values() {
        let mut ctx = Context::new();
        ctx.add("dev", "{dev-1}", "dev-1-value");
        ctx.add("dev", "{dev-2}", "dev-2-value");
        ctx.add("prod", "{prod-1}", "prod-1-value");

        let values = ctx.all_key_values("dev");
        assert_eq!(values.len(), 2);
        assert_eq!(values["{dev-1}"], "dev-1-value");
        assert_eq!(values["{dev-2}"], "dev-2-value");
        assert!(ctx.all_key_values("missing").is_empty());
    }

    #[test]
    fn test_find_missing() {
        let ctx = Context::new();
        assert!(ctx.find("dev", "{dev-1}").is_none());
    }

    #[test]
    fn test_deserialize_null_env() {
        let ctx: Context = serde_json::from_str(r#"{"Env":null}"#).unwrap();
        assert_eq!(ctx.list_environments(), vec!["default"]);
    }
}
