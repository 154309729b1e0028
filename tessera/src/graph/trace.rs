use ahash::AHashSet;
use std::hash::Hash;

/// Trace of a walk around a ring.
pub trait Trace<T> {
    /// Inserts the given breadcrumb into the trace.
    ///
    /// Returns `false` if the breadcrumb intersects the trace, in which case
    /// the walk should terminate.
    fn insert(&mut self, breadcrumb: T) -> bool;
}

/// Trace that detects a return to the first breadcrumb.
///
/// This trace only stores the first breadcrumb, so it should only be used to
/// walk rings that are known to be closed, such as the rings of a committed
/// graph. A walk over a ring that never returns to its start will not be
/// terminated.
#[derive(Clone, Copy, Debug)]
pub struct TraceFirst<T>
where
    T: Copy,
{
    breadcrumb: Option<T>,
}

impl<T> Default for TraceFirst<T>
where
    T: Copy,
{
    fn default() -> Self {
        TraceFirst { breadcrumb: None }
    }
}

impl<T> Trace<T> for TraceFirst<T>
where
    T: Copy + Eq,
{
    fn insert(&mut self, breadcrumb: T) -> bool {
        match self.breadcrumb {
            Some(intersection) => intersection != breadcrumb,
            None => {
                self.breadcrumb = Some(breadcrumb);
                true
            }
        }
    }
}

/// Trace that detects any breadcrumb that has been previously encountered.
///
/// This trace is used when walking rings of unknown consistency, such as
/// those read from a buffer.
#[derive(Clone, Debug)]
pub struct TraceAny<T>
where
    T: Copy + Eq + Hash,
{
    breadcrumbs: AHashSet<T>,
}

impl<T> Default for TraceAny<T>
where
    T: Copy + Eq + Hash,
{
    fn default() -> Self {
        TraceAny {
            breadcrumbs: AHashSet::new(),
        }
    }
}

impl<T> Trace<T> for TraceAny<T>
where
    T: Copy + Eq + Hash,
{
    fn insert(&mut self, breadcrumb: T) -> bool {
        self.breadcrumbs.insert(breadcrumb)
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::trace::{Trace, TraceAny, TraceFirst};

    #[test]
    fn trace_first_detects_return_to_start() {
        let mut trace = TraceFirst::default();

        assert!(trace.insert(1u32));
        assert!(trace.insert(2));
        assert!(trace.insert(2));
        assert!(!trace.insert(1));
    }

    #[test]
    fn trace_any_detects_any_revisit() {
        let mut trace = TraceAny::default();

        assert!(trace.insert(1u32));
        assert!(trace.insert(2));
        assert!(!trace.insert(2));
    }
}
