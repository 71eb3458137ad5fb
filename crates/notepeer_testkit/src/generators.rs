//! Property-based test generators using proptest.

use notepeer_protocol::Message;
use proptest::prelude::*;

/// Strategy for note keys as users type them: letters, digits, spaces and
/// common punctuation.
pub fn note_key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9][A-Za-z0-9 '_.,:!?()-]{0,39}").expect("Invalid regex")
}

/// Strategy for note bodies (arbitrary text, including empty).
pub fn note_content_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => any::<String>(),
        1 => Just(String::new()),
        1 => prop::collection::vec("[a-z ]{0,20}", 1..6).prop_map(|lines| lines.join("\n")),
    ]
}

/// A registry operation for model-based tests.
#[derive(Debug, Clone)]
pub enum RegistryOperation {
    /// Register a note
    Register {
        /// Note key
        key: String,
        /// Note content
        content: String,
    },
    /// Delete a note
    Delete {
        /// Note key
        key: String,
    },
    /// Read a note
    Get {
        /// Note key
        key: String,
    },
}

/// Strategy for registry operations over a small key space, so keys repeat.
pub fn registry_operation_strategy() -> impl Strategy<Value = RegistryOperation> {
    let key = prop::sample::select(vec!["alpha", "Alpha", "beta notes", "gamma"])
        .prop_map(str::to_string);
    prop_oneof![
        3 => (key.clone(), note_content_strategy())
            .prop_map(|(key, content)| RegistryOperation::Register { key, content }),
        1 => key.clone().prop_map(|key| RegistryOperation::Delete { key }),
        2 => key.prop_map(|key| RegistryOperation::Get { key }),
    ]
}

/// Strategy for request messages a well-behaved client sends.
pub fn request_strategy() -> impl Strategy<Value = Message> {
    prop_oneof![
        note_key_strategy().prop_map(Message::note_request),
        (note_key_strategy(), note_content_strategy())
            .prop_map(|(k, c)| Message::register_note(k, c)),
        note_key_strategy().prop_map(Message::delete_note),
        Just(Message::ListKeys),
    ]
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
