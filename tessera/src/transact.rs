use std::fmt::Debug;

/// Transaction over some state.
///
/// A transaction accumulates changes that are only applied if the transaction
/// is committed. Committing consumes the transaction and yields its output or
/// an error. Aborting (or dropping) a transaction discards its changes.
pub trait Transact<T = ()>: Sized {
    type Output;
    type Error: Debug;

    fn commit(self) -> Result<Self::Output, Self::Error>;

    /// Applies a function to the transaction and commits it.
    ///
    /// If the function fails, then the transaction is aborted and the error is
    /// returned.
    fn commit_with<F, U, E>(mut self, f: F) -> Result<(Self::Output, U), Self::Error>
    where
        F: FnOnce(&mut Self) -> Result<U, E>,
        E: Into<Self::Error>,
    {
        match f(&mut self) {
            Ok(value) => self.commit().map(|output| (output, value)),
            Err(error) => {
                self.abort();
                Err(error.into())
            }
        }
    }

    fn abort(self) {}
}
