/// Kotlin style `let`, handy at the end of long method chains.
pub trait LetAlso: Sized {
    /// Consumes `self` and maps it with `f`.
    fn let_owned<R, F>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> LetAlso for T {}
