use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Read-only view used by variable substitution.
pub trait VarLookup {
    fn lookup(&self, name: &str) -> Option<&str>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    vars: HashMap<String, String>,
    logical_pwd: PathBuf,
}

impl Environment {
    pub fn new() -> Self {
        // Import all OS environment variables when starting the process
        let vars = std::env::vars().collect();
        let logical_pwd = std::env::var_os("PWD")
            .map(PathBuf::from)
            .filter(|p| p.is_absolute())
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("/"));

        Environment { vars, logical_pwd }
    }

    /// An environment with no variables, rooted at `pwd`.
    pub fn empty(pwd: impl Into<PathBuf>) -> Self {
        Environment {
            vars: HashMap::new(),
            logical_pwd: pwd.into(),
        }
    }

    pub fn setup_defaults(&mut self) {
        for (key, value) in [("PROMPT", ">> "), ("MYSH_VERSION", "1.0")] {
            if !self.vars.contains_key(key) {
                self.set(key, value);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|v| v.as_str())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
    }

    pub fn unset(&mut self, key: &str) {
        self.vars.remove(key);
    }

    /// Snapshot handed to child processes at spawn time.
    pub fn vars(&self) -> Vec<(String, String)> {
        self.vars
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn logical_pwd(&self) -> &Path {
        &self.logical_pwd
    }

    pub fn set_logical_pwd(&mut self, pwd: PathBuf) {
        self.logical_pwd = pwd;
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl VarLookup for Environment {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name)
    }
}

impl VarLookup for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(|v| v.as_str())
    }
}
