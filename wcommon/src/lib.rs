//! Shared primitives for the weft workspace crates.
//!
//! ```rust
//! use wcommon::{GenerationOptions, MetadataMap, SessionId};
//!
//! let session = SessionId::from("session-1");
//! let mut metadata = MetadataMap::new();
//! metadata.insert("tenant".to_string(), "demo".to_string());
//!
//! let options = GenerationOptions::default().with_temperature(0.4).enable_streaming();
//! assert_eq!(session.as_str(), "session-1");
//! assert!(options.stream);
//! ```

pub mod future {
    //! Boxed future alias shared by the async trait seams.

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod context {
    //! Session and trace identifier newtypes plus free-form metadata.
    //!
    //! ```rust
    //! use wcommon::{SessionId, TraceId};
    //!
    //! let session = SessionId::new("s-9");
    //! let trace = TraceId::from("t-9");
    //! assert_eq!(session.to_string(), "s-9");
    //! assert_eq!(trace.as_str(), "t-9");
    //! ```

    use std::collections::HashMap;
    use std::fmt::{Display, Formatter};

    pub type MetadataMap = HashMap<String, String>;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct SessionId(String);

    impl SessionId {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }
    }

    impl Display for SessionId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for SessionId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for SessionId {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct TraceId(String);

    impl TraceId {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }
    }

    impl Display for TraceId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for TraceId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for TraceId {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }
}

pub mod model {
    //! Sampling settings attached to completion requests.

    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct GenerationOptions {
        pub temperature: Option<f32>,
        pub max_tokens: Option<u32>,
        pub stream: bool,
    }

    impl GenerationOptions {
        pub fn with_temperature(mut self, temperature: f32) -> Self {
            self.temperature = Some(temperature);
            self
        }

        pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
            self.max_tokens = Some(max_tokens);
            self
        }

        pub fn enable_streaming(mut self) -> Self {
            self.stream = true;
            self
        }
    }
}

pub mod registry {
    //! Name-keyed registry map used by the tool layer. Iteration follows
    //! insertion order so anything derived from the registry is stable
    //! across runs.
    //!
    //! ```rust
    //! use wcommon::Registry;
    //!
    //! let mut registry = Registry::new();
    //! registry.insert("echo", 1_u32);
    //! assert_eq!(registry.get("echo"), Some(&1));
    //! ```

    use std::collections::HashMap;

    #[derive(Debug, Clone)]
    pub struct Registry<V> {
        // `names` carries the insertion order; `items` owns the values.
        names: Vec<String>,
        items: HashMap<String, V>,
    }

    impl<V> Default for Registry<V> {
        fn default() -> Self {
            Self {
                names: Vec::new(),
                items: HashMap::new(),
            }
        }
    }

    impl<V> Registry<V> {
        pub fn new() -> Self {
            Self::default()
        }

        /// Inserts a value, returning the previous value if the name was
        /// already present. Replacement keeps the original position.
        pub fn insert(&mut self, name: impl Into<String>, value: V) -> Option<V> {
            let name = name.into();
            if !self.items.contains_key(&name) {
                self.names.push(name.clone());
            }
            self.items.insert(name, value)
        }

        pub fn get(&self, name: &str) -> Option<&V> {
            self.items.get(name)
        }

        pub fn remove(&mut self, name: &str) -> Option<V> {
            let removed = self.items.remove(name)?;
            self.names.retain(|existing| existing != name);
            Some(removed)
        }

        pub fn contains(&self, name: &str) -> bool {
            self.items.contains_key(name)
        }

        /// Values in insertion order.
        pub fn values(&self) -> impl Iterator<Item = &V> {
            self.names.iter().filter_map(|name| self.items.get(name))
        }

        pub fn len(&self) -> usize {
            self.items.len()
        }

        pub fn is_empty(&self) -> bool {
            self.items.is_empty()
        }
    }
}

pub use context::{MetadataMap, SessionId, TraceId};
pub use future::BoxFuture;
pub use model::GenerationOptions;
pub use registry::Registry;

#[cfg(test)]
mod tests {
    use super::{GenerationOptions, Registry, SessionId, TraceId};

    #[test]
    fn id_newtypes_round_trip_strings() {
        let session = SessionId::new("session-7");
        let trace = TraceId::from("trace-7");

        assert_eq!(session.as_str(), "session-7");
        assert_eq!(trace.to_string(), "trace-7");
    }

    #[test]
    fn generation_options_builders_set_fields() {
        let options = GenerationOptions::default()
            .with_temperature(0.2)
            .with_max_tokens(64)
            .enable_streaming();

        assert_eq!(options.temperature, Some(0.2));
        assert_eq!(options.max_tokens, Some(64));
        assert!(options.stream);
    }

    #[test]
    fn registry_lifecycle() {
        let mut registry = Registry::new();
        assert!(registry.is_empty());

        registry.insert("alpha", 3_u8);
        assert!(registry.contains("alpha"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.remove("alpha"), Some(3));
        assert!(registry.is_empty());
    }

    #[test]
    fn registry_values_follow_insertion_order_through_replacement() {
        let mut registry = Registry::new();
        registry.insert("gamma", 1_u8);
        registry.insert("alpha", 2);
        registry.insert("gamma", 3);

        let values: Vec<u8> = registry.values().copied().collect();
        assert_eq!(values, [3, 2]);
    }
}
