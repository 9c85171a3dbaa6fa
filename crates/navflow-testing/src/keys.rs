use std::fmt;

use navflow_core::{BindingTag, Key, ScopeRelations, ScopeTag};
use serde::{Deserialize, Serialize};

/// A key assembled at runtime: a name, optional components and scope
/// relations. Serializable so it round-trips through JSON codecs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestKey {
    name: String,
    #[serde(default)]
    transient: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    components: Vec<TestKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    relations: Vec<(String, String)>,
}

impl TestKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transient: false,
            components: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// A composite named `name` layered over `components`, outermost first.
    pub fn composite(
        name: impl Into<String>,
        components: impl IntoIterator<Item = TestKey>,
    ) -> Self {
        let mut key = Self::new(name);
        key.components.extend(components);
        key
    }

    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    pub fn over(mut self, component: TestKey) -> Self {
        self.components.push(component);
        self
    }

    pub fn uses(mut self, scope: impl Into<String>, binding: impl Into<String>) -> Self {
        self.relations.push((scope.into(), binding.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Key for TestKey {
    fn components(&self) -> Vec<Self> {
        self.components.clone()
    }

    fn is_transient(&self) -> bool {
        self.transient
    }

    fn scope_relations(&self) -> ScopeRelations {
        self.relations
            .iter()
            .map(|(scope, binding)| {
                (
                    ScopeTag::from(scope.clone()),
                    BindingTag::from(binding.clone()),
                )
            })
            .collect()
    }
}

impl From<&str> for TestKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Debug for TestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.components.is_empty() {
            f.debug_list().entries(self.components.iter()).finish()?;
        }
        if self.transient {
            f.write_str("~")?;
        }
        Ok(())
    }
}
