//! Ordered argument store with accumulate-vs-replace semantics.

use indexmap::IndexMap;

use crate::args::argument::Argument;

/// Insertion-ordered multimap from argument key to the arguments stored
/// under it.
///
/// A key whose argument variant disallows multiple values (a system
/// property) holds at most one argument at all times; `add` on such a key
/// replaces. Rendering walks keys in first-insertion order, then arguments
/// in insertion order within a key, so a fixed mutation sequence always
/// renders the same token list.
#[derive(Debug, Clone, Default)]
pub struct ArgumentCollection {
    map: IndexMap<String, Vec<Argument>>,
}

impl ArgumentCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Drop every stored argument.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Parse a raw token and add it.
    pub fn add_raw(&mut self, raw: &str) {
        self.add(Argument::parse(raw));
    }

    /// Parse and add every token in order.
    pub fn add_all<I, S>(&mut self, raws: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for raw in raws {
            self.add_raw(raw.as_ref());
        }
    }

    /// Keyed add. A `-D` prefix on the key selects the system-property
    /// variant (and is stripped for identity).
    pub fn add_pair(&mut self, key: &str, value: Option<&str>) {
        if key.starts_with("-D") {
            self.add(Argument::system_property(key, value));
        } else {
            self.add(Argument::plain(key, value));
        }
    }

    /// Keyed set guaranteeing a single stored value. A `None` value is a
    /// deletion signal: the key is removed entirely.
    pub fn set_pair(&mut self, key: &str, value: Option<&str>) {
        match value {
            None => {
                let key = key.strip_prefix("-D").unwrap_or(key);
                self.map.shift_remove(key);
            }
            Some(value) => {
                if key.starts_with("-D") {
                    self.set(Argument::system_property(key, Some(value)));
                } else {
                    self.set(Argument::plain(key, Some(value)));
                }
            }
        }
    }

    /// Add an argument. Appends when the key already accumulates and the
    /// variant allows multiples; replaces otherwise.
    pub fn add(&mut self, argument: Argument) {
        if argument.multiple_values_allowed() {
            self.map
                .entry(argument.key().to_string())
                .or_default()
                .push(argument);
        } else {
            self.set(argument);
        }
    }

    /// Replace whatever is stored for the argument's key with this single
    /// argument. Further plain `add` calls on the key resume accumulation.
    pub fn set(&mut self, argument: Argument) {
        self.map.insert(argument.key().to_string(), vec![argument]);
    }

    /// Remove a key and return its prior contents.
    pub fn remove(&mut self, key: &str) -> Option<Vec<Argument>> {
        self.map.shift_remove(key)
    }

    /// The value of the first stored argument for the key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map
            .get(key)
            .and_then(|args| args.first())
            .and_then(Argument::value)
    }

    /// All arguments stored under the key, in insertion order.
    pub fn arguments(&self, key: &str) -> &[Argument] {
        self.map.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every stored argument in rendering order.
    pub fn iter(&self) -> impl Iterator<Item = &Argument> {
        self.map.values().flatten()
    }

    /// The stored arguments as command-line tokens, in key-insertion order
    /// and then argument-insertion order within a key.
    pub fn render(&self) -> Vec<String> {
        self.iter().map(Argument::as_command_line).collect()
    }
}
