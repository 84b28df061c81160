use crate::error::{Error, Result};
use crate::scheduling::incompatibility::IncompatibilityGraph;
use crate::scheduling::operation::Operation;

/// A conflict-free set of operations that one room can perform in a day.
/// Members are operation indices, kept sorted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    operations: Vec<usize>,
}

impl Pattern {
    pub fn new(mut operations: Vec<usize>) -> Self {
        operations.sort_unstable();
        operations.dedup();
        Self { operations }
    }

    pub fn operations(&self) -> &[usize] {
        &self.operations
    }

    pub fn contains(&self, operation: usize) -> bool {
        self.operations.binary_search(&operation).is_ok()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn ids<'a>(&'a self, operations: &'a [Operation]) -> impl Iterator<Item = &'a str> + 'a {
        self.operations.iter().map(move |&i| operations[i].id.as_str())
    }
}

/// Append-only pool of patterns with an operation → pattern incidence index.
#[derive(Debug, Clone)]
pub struct PatternPool {
    patterns: Vec<Pattern>,
    incidence: Vec<Vec<usize>>,
}

impl PatternPool {
    pub fn new(num_operations: usize) -> Self {
        Self {
            patterns: Vec::new(),
            incidence: vec![Vec::new(); num_operations],
        }
    }

    pub fn from_patterns(num_operations: usize, patterns: Vec<Pattern>) -> Result<Self> {
        let mut pool = Self::new(num_operations);
        for pattern in patterns {
            pool.push(pattern)?;
        }
        Ok(pool)
    }

    /// Appends `pattern` and returns its index.
    pub fn push(&mut self, pattern: Pattern) -> Result<usize> {
        if let Some(&op) = pattern.operations().last() {
            if op >= self.incidence.len() {
                return Err(Error::invalid_input(format!(
                    "pattern references operation {} of {}",
                    op,
                    self.incidence.len()
                )));
            }
        }
        let index = self.patterns.len();
        for &op in pattern.operations() {
            self.incidence[op].push(index);
        }
        self.patterns.push(pattern);
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn num_operations(&self) -> usize {
        self.incidence.len()
    }

    pub fn get(&self, index: usize) -> Option<&Pattern> {
        self.patterns.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pattern> {
        self.patterns.iter()
    }

    /// Indices of the patterns containing `operation`.
    pub fn containing(&self, operation: usize) -> &[usize] {
        &self.incidence[operation]
    }

    pub fn contains_pattern(&self, pattern: &Pattern) -> bool {
        self.patterns.iter().any(|p| p == pattern)
    }

    /// First operation no pattern covers.
    pub fn first_uncovered(&self) -> Option<usize> {
        self.incidence.iter().position(|patterns| patterns.is_empty())
    }

    /// Fails with `UncoveredOperation` if some operation is in no pattern.
    pub fn ensure_covers(&self, operations: &[Operation]) -> Result<()> {
        match self.first_uncovered() {
            Some(i) => Err(Error::UncoveredOperation(operations[i].id.clone())),
            None => Ok(()),
        }
    }

    /// Fails with `ConflictingPattern` if some pattern is not independent.
    pub fn ensure_independent(
        &self,
        graph: &IncompatibilityGraph,
        operations: &[Operation],
    ) -> Result<()> {
        for pattern in &self.patterns {
            if let Some((i, j)) = graph.find_conflict(pattern.operations()) {
                return Err(Error::ConflictingPattern {
                    first: operations[i].id.clone(),
                    second: operations[j].id.clone(),
                });
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a PatternPool {
    type Item = &'a Pattern;
    type IntoIter = std::slice::Iter<'a, Pattern>;

    fn into_iter(self) -> Self::IntoIter {
        self.patterns.iter()
    }
}
