use heck::{ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};

/// A multi-part identifier, convertible between casing conventions.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Name {
    pub parts: Vec<String>,
}

impl Name {
    pub fn new(src: &str) -> Self {
        let parts = src
            .to_snake_case()
            .split('_')
            .filter(|part| !part.is_empty())
            .map(String::from)
            .collect();
        Self { parts }
    }

    /// Builds a name from a Rust type path, keeping only the last path
    /// segment of the outermost type: `app::model::Country` becomes
    /// `Country`, `app::Wrapper<app::Inner>` becomes `Wrapper`.
    pub fn from_type_name(type_name: &str) -> Self {
        let outer = type_name.split('<').next().unwrap_or(type_name);
        let simple = outer.rsplit("::").next().unwrap_or(outer);
        Self::new(simple)
    }

    pub fn camel_case(&self) -> String {
        self.snake_case().to_lower_camel_case()
    }

    pub fn upper_camel_case(&self) -> String {
        self.snake_case().to_upper_camel_case()
    }

    pub fn snake_case(&self) -> String {
        self.parts.join("_")
    }

    pub fn upper_snake_case(&self) -> String {
        self.snake_case().to_shouty_snake_case()
    }
}
