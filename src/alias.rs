//! Setter-to-state-variable aliasing.
//!
//! Two declaration forms are recognized, for any configured state constructor (by default
//! `useState`, also reached as `React.useState` and with generic arguments):
//!
//! ```text
//! const [isOpen, setIsOpen] = useState(false);   // setIsOpen -> isOpen
//! const isOpen = useState(false)[0];             // setIsOpen -> isOpen (setter synthesized)
//! ```

use crate::syntax::{strip_type_annotation, Binding, SourceTree};

/// Setter name to state variable name, in declaration order.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct SetterAliases {
    entries: Vec<(String, String)>,
}

impl SetterAliases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `setter -> variable`; a later declaration of the same setter replaces the earlier.
    pub fn insert(&mut self, setter: impl Into<String>, variable: impl Into<String>) {
        let setter = setter.into();
        let variable = variable.into();
        match self.entries.iter_mut().find(|(s, _)| *s == setter) {
            Some(entry) => entry.1 = variable,
            None => self.entries.push((setter, variable)),
        }
    }

    pub fn get(&self, setter: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(s, _)| s == setter)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_setter(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// `(setter, variable)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(s, v)| (s.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `isOpen` -> `setIsOpen`.
pub fn synthesize_setter(variable: &str) -> String {
    let mut chars = variable.chars();
    match chars.next() {
        Some(first) => format!("set{}{}", first.to_uppercase(), chars.as_str()),
        None => "set".to_string(),
    }
}

/// Scans the whole source for state declarations made with one of `constructors`.
pub fn extract_setter_aliases(tree: &SourceTree, constructors: &[String]) -> SetterAliases {
    let mut aliases = SetterAliases::new();

    for decl in tree.variable_declarations() {
        let Some(call) = tree.call_at(decl.init.start) else {
            continue;
        };
        let is_state_call = call
            .path
            .last()
            .is_some_and(|name| constructors.iter().any(|c| c == name));
        if !is_state_call {
            continue;
        }

        match &decl.binding {
            Binding::Array(elements) => {
                if elements.len() < 2 {
                    continue;
                }
                let variable = strip_type_annotation(&elements[0]);
                let setter = strip_type_annotation(&elements[1]);
                if variable.is_empty() || setter.is_empty() {
                    continue;
                }
                log::debug!("State hook: {} -> {}", setter, variable);
                aliases.insert(setter, variable);
            }
            Binding::Name(raw) => {
                let first_slot = tree.is_punct(call.end, "[")
                    && tree.token(call.end + 1) == "0"
                    && tree.is_punct(call.end + 2, "]");
                if !first_slot {
                    continue;
                }
                let variable = strip_type_annotation(raw);
                if variable.is_empty() {
                    continue;
                }
                let setter = synthesize_setter(variable);
                log::debug!("State hook (first slot): {} -> {}", setter, variable);
                aliases.insert(setter, variable);
            }
        }
    }

    aliases
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    fn aliases_of(src: &str) -> SetterAliases {
        extract_setter_aliases(&SourceTree::parse(src), &["useState".to_string()])
    }

    #[test]
    fn test_destructured_hooks() {
        let src = r#"
            const [isLoading, setIsLoading] = useState<boolean>(true);
            const [isDarkMode, setIsDarkMode] = React.useState(initialDarkMode);
            const [count, setCount] = useReducer(reducer, 0);
        "#;
        let aliases = aliases_of(src);
        let pairs: Vec<_> = aliases.iter().collect();
        assert_eq!(pairs, vec![("setIsLoading", "isLoading"), ("setIsDarkMode", "isDarkMode")]);
    }

    #[test]
    fn test_type_annotations_stripped() {
        let aliases = aliases_of("const [isOpen: boolean, setOpen: Setter] = useState(false);");
        assert_eq!(aliases.get("setOpen"), Some("isOpen"));
    }

    #[test]
    fn test_first_slot_form() {
        let src = "const isMuted: boolean = useState(false)[0];\nconst other = useState(false)[1];";
        let aliases = aliases_of(src);
        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases.get("setIsMuted"), Some("isMuted"));
    }

    #[test]
    fn test_no_declarations() {
        assert!(aliases_of("const x = 1; function f() { return x; }").is_empty());
    }

    #[test]
    fn test_custom_constructor() {
        let tree = SourceTree::parse("const [on, setOn] = useToggle(false);");
        let aliases = extract_setter_aliases(&tree, &["useToggle".to_string()]);
        assert_eq!(aliases.get("setOn"), Some("on"));
    }

    #[test]
    fn test_synthesize_setter() {
        assert_eq!(synthesize_setter("isOpen"), "setIsOpen");
        assert_eq!(synthesize_setter("x"), "setX");
    }
}
