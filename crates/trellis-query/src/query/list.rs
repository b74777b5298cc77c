//! Persistent step sequence.
//!
//! A snoc list of reference counted nodes: appending allocates one node
//! pointing at the previous tail, so every derived list shares its whole
//! prefix with the list it was derived from.

use crate::step::Step;
use std::fmt;
use std::sync::Arc;

struct Node {
    step: Step,
    prev: Option<Arc<Node>>,
    len: usize,
}

/// Immutable ordered sequence of steps with structural sharing
#[derive(Clone, Default)]
pub struct StepList {
    last: Option<Arc<Node>>,
}

impl StepList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.last.as_ref().map_or(0, |node| node.len)
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_none()
    }

    /// New list with `step` appended; `self` is left untouched
    pub fn push(&self, step: Step) -> Self {
        let len = self.len() + 1;
        Self {
            last: Some(Arc::new(Node {
                step,
                prev: self.last.clone(),
                len,
            })),
        }
    }

    pub fn last(&self) -> Option<&Step> {
        self.last.as_deref().map(|node| &node.step)
    }

    /// Steps in order, first to last
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Step> + ExactSizeIterator + '_ {
        let mut steps = Vec::with_capacity(self.len());
        let mut cursor = self.last.as_deref();
        while let Some(node) = cursor {
            steps.push(&node.step);
            cursor = node.prev.as_deref();
        }
        steps.reverse();
        steps.into_iter()
    }

    /// Whether `other` was derived from `self` by appending, reusing the
    /// very same nodes for the shared prefix.
    pub fn shares_prefix_with(&self, other: &StepList) -> bool {
        if other.len() < self.len() {
            return false;
        }

        let mut cursor = other.last.as_ref();
        while let Some(node) = cursor {
            if node.len == self.len() {
                break;
            }
            cursor = node.prev.as_ref();
        }

        match (cursor, self.last.as_ref()) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl Drop for StepList {
    // Unlink iteratively so long lists do not overflow the stack on drop.
    fn drop(&mut self) {
        let mut cursor = self.last.take();
        while let Some(node) = cursor {
            match Arc::try_unwrap(node) {
                Ok(mut node) => cursor = node.prev.take(),
                Err(_) => break,
            }
        }
    }
}

impl FromIterator<Step> for StepList {
    fn from_iter<I: IntoIterator<Item = Step>>(iter: I) -> Self {
        iter.into_iter()
            .fold(StepList::new(), |list, step| list.push(step))
    }
}

impl PartialEq for StepList {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl fmt::Debug for StepList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
