//! Construction-time configuration.
use crate::trie::Trie;

/// Configures and creates a [`Trie`].
///
/// Both knobs are fixed for the lifetime of the trie: sibling ordering
/// because [`Trie::predictive_search`] relies on it, the trial budget
/// because the block lists are classified against it.
///
/// # Examples
///
/// ```
/// use dartrie::Builder;
///
/// let mut trie = Builder::new().ordered(false).max_trial(8).build();
/// trie.insert(b"key", 1).unwrap();
/// assert_eq!(trie.get(b"key"), Ok(1));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Builder {
    ordered: bool,
    max_trial: i32,
}

impl Builder {
    /// Creates a builder with the default configuration: ordered sibling
    /// chains and a placement budget of one trial per block.
    pub const fn new() -> Self {
        Self {
            ordered: true,
            max_trial: 1,
        }
    }

    /// Keeps sibling chains in ascending label order (the default).
    ///
    /// When disabled, new siblings are prepended and
    /// [`Trie::predictive_search`] yields keys in an
    /// insertion-dependent order.
    pub const fn ordered(mut self, ordered: bool) -> Self {
        self.ordered = ordered;
        self
    }

    /// Sets how many placement attempts a block endures before it is
    /// retired from multi-slot placement. Larger budgets pack denser at
    /// the cost of slower insertion. Values below 1 are clamped to 1.
    pub const fn max_trial(mut self, max_trial: i32) -> Self {
        self.max_trial = if max_trial < 1 { 1 } else { max_trial };
        self
    }

    /// Creates the empty trie.
    pub fn build(self) -> Trie {
        Trie::with_options(self.ordered, self.max_trial)
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_new() {
        let built = Builder::new().build();
        let fresh = Trie::new();
        assert_eq!(built, fresh);
    }

    #[test]
    fn options_are_recorded() {
        let trie = Builder::new().ordered(false).max_trial(4).build();
        assert!(!trie.is_ordered());
        assert_eq!(trie.max_trial(), 4);
    }

    #[test]
    fn trial_budget_is_clamped() {
        let trie = Builder::new().max_trial(0).build();
        assert_eq!(trie.max_trial(), 1);
    }
}
