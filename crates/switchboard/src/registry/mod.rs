//! Command registry mapping `group.name` pairs to handlers.
//!
//! A [`CommandRegistry`] maps group names to [`CommandSet`]s, which in turn map
//! command names to [`CommandHandler`]s. Adding a set to an existing group
//! merges it: new names are inserted, existing names are overwritten, other
//! names are left alone. The registry itself is not synchronised; a
//! connection guards it with its own lock.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::Arc;

use crate::logger::ConnLogger;

/// Handler invoked with the connection logger and the raw envelope body.
pub type CommandHandler =
    Arc<dyn Fn(&dyn ConnLogger, &[u8]) -> anyhow::Result<()> + Send + Sync>;

/// Commands of a single group, keyed by name.
///
/// # Example
///
/// ```
/// use switchboard::CommandSet;
///
/// let set = CommandSet::new()
///     .with("login", |_log, _body| Ok(()))
///     .with("logout", |_log, _body| Ok(()));
/// assert_eq!(set.len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct CommandSet {
    commands: HashMap<String, CommandHandler>,
}

impl CommandSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handler and returns the set, for chained construction.
    #[must_use]
    pub fn with<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&dyn ConnLogger, &[u8]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.insert(name, handler);
        self
    }

    /// Inserts a handler, replacing any handler already bound to `name`.
    pub fn insert<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&dyn ConnLogger, &[u8]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.commands.insert(name.into(), Arc::new(handler));
    }

    /// Looks up a handler by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CommandHandler> {
        self.commands.get(name)
    }

    /// Removes a handler, returning whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        self.commands.remove(name).is_some()
    }

    /// Returns `true` when a handler is bound to `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Returns the registered command names in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Returns the number of commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` when the set holds no commands.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn merge(&mut self, other: Self) {
        self.commands.extend(other.commands);
    }
}

impl fmt::Debug for CommandSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("CommandSet").field("commands", &names).finish()
    }
}

/// Outcome of resolving a `group.name` pair.
#[derive(Clone)]
pub enum Lookup {
    /// A handler is bound to the pair.
    Found(CommandHandler),
    /// No group with this name is registered.
    UnknownGroup,
    /// The group exists but has no command with this name.
    UnknownCommand,
}

impl fmt::Debug for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(_) => f.write_str("Found(..)"),
            Self::UnknownGroup => f.write_str("UnknownGroup"),
            Self::UnknownCommand => f.write_str("UnknownCommand"),
        }
    }
}

/// Registry of command groups.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    groups: HashMap<String, CommandSet>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `set` into `group`, creating the group if absent.
    pub fn add(&mut self, group: impl Into<String>, set: CommandSet) {
        match self.groups.entry(group.into()) {
            Entry::Occupied(mut existing) => existing.get_mut().merge(set),
            Entry::Vacant(slot) => {
                slot.insert(set);
            }
        }
    }

    /// Removes a whole group, returning whether it was present.
    pub fn remove_group(&mut self, group: &str) -> bool {
        self.groups.remove(group).is_some()
    }

    /// Removes the named commands from `group`.
    ///
    /// Returns the names that were actually removed, in argument order. An
    /// unknown group removes nothing. The group itself stays registered even
    /// when it ends up empty.
    pub fn remove_names<I, S>(&mut self, group: &str, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Some(set) = self.groups.get_mut(group) else {
            return Vec::new();
        };
        names
            .into_iter()
            .filter(|name| set.remove(name.as_ref()))
            .map(|name| name.as_ref().to_owned())
            .collect()
    }

    /// Resolves `group.name` to a handler.
    #[must_use]
    pub fn lookup(&self, group: &str, name: &str) -> Lookup {
        match self.groups.get(group) {
            None => Lookup::UnknownGroup,
            Some(set) => set
                .get(name)
                .map_or(Lookup::UnknownCommand, |handler| {
                    Lookup::Found(Arc::clone(handler))
                }),
        }
    }

    /// Returns the commands of `group`.
    #[must_use]
    pub fn group(&self, group: &str) -> Option<&CommandSet> {
        self.groups.get(group)
    }

    /// Returns `true` when `group` is registered.
    #[must_use]
    pub fn contains_group(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    /// Returns the number of registered groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns `true` when no groups are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
