//! Property-based test generators using proptest.
//!
//! Texts mix ASCII with multi-byte characters so that anything confusing
//! bytes with characters shows up quickly.

use proptest::prelude::*;

/// Strategy for generating document texts.
pub fn text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[abxyé🙂 ]{0,24}").expect("Invalid regex")
}

/// Strategy for generating short inserted texts.
pub fn insert_text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Zü]{0,4}").expect("Invalid regex")
}

/// One contiguous edit: delete `delete` characters at `at`, then insert
/// `insert` there. Positions are clamped to the text it is applied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    /// Character position.
    pub at: usize,
    /// Characters to delete.
    pub delete: usize,
    /// Text to insert.
    pub insert: String,
}

impl Splice {
    /// Applies the splice to `text`.
    pub fn apply_to(&self, text: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        let at = self.at.min(chars.len());
        let end = (at + self.delete).min(chars.len());
        let mut out: String = chars[..at].iter().collect();
        out.push_str(&self.insert);
        out.extend(&chars[end..]);
        out
    }
}

/// Strategy for generating splices.
pub fn splice_strategy() -> impl Strategy<Value = Splice> {
    (0usize..32, 0usize..6, insert_text_strategy())
        .prop_map(|(at, delete, insert)| Splice { at, delete, insert })
}

/// Strategy for a base text and one edited version of it.
pub fn edit_strategy() -> impl Strategy<Value = (String, String)> {
    (text_strategy(), prop::collection::vec(splice_strategy(), 1..4)).prop_map(|(base, splices)| {
        let edited = splices
            .iter()
            .fold(base.clone(), |text, splice| splice.apply_to(&text));
        (base, edited)
    })
}

/// Strategy for a base text and two independent edits of it.
pub fn concurrent_edits_strategy() -> impl Strategy<Value = (String, String, String)> {
    (text_strategy(), splice_strategy(), splice_strategy()).prop_map(|(base, a, b)| {
        let left = a.apply_to(&base);
        let right = b.apply_to(&base);
        (base, left, right)
    })
}

/// A step taken by one simulated client.
#[derive(Debug, Clone)]
pub enum ClientAction {
    /// Edit the local content.
    Edit(Splice),
    /// Submit pending edits.
    Flush,
    /// Apply broadcast events.
    Drain,
}

/// Strategy for client actions.
pub fn client_action_strategy() -> impl Strategy<Value = ClientAction> {
    prop_oneof![
        3 => splice_strategy().prop_map(ClientAction::Edit),
        2 => Just(ClientAction::Flush),
        2 => Just(ClientAction::Drain),
    ]
}

/// Strategy for an interleaving of actions across `clients` clients.
pub fn client_script_strategy(
    clients: usize,
    min_steps: usize,
    max_steps: usize,
) -> impl Strategy<Value = Vec<(usize, ClientAction)>> {
    prop::collection::vec((0..clients, client_action_strategy()), min_steps..max_steps)
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

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
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
