/// Runs a closure exactly once when dropped.
///
/// Used to tie the release of an external resource to a lexical scope so that
/// early returns and `?` propagation release it too.
#[derive(Debug)]
pub struct ScopeRef<F>
where
    F: FnOnce(),
{
    on_drop: Option<F>,
}

impl<F> ScopeRef<F>
where
    F: FnOnce(),
{
    pub fn new(on_drop: F) -> Self {
        Self {
            on_drop: Some(on_drop),
        }
    }
}

impl<F> Drop for ScopeRef<F>
where
    F: FnOnce(),
{
    fn drop(&mut self) {
        if let Some(on_drop) = self.on_drop.take() {
            on_drop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ScopeRef;
    use std::cell::Cell;

    fn fallible(counter: &Cell<u32>, fail: bool) -> Result<u32, &'static str> {
        let _guard = ScopeRef::new(|| counter.set(counter.get() + 1));
        if fail {
            return Err("failed");
        }
        Ok(7)
    }

    #[test]
    fn released_on_success_and_error_paths() {
        let counter = Cell::new(0);

        assert_eq!(fallible(&counter, false), Ok(7));
        assert_eq!(counter.get(), 1);

        assert_eq!(fallible(&counter, true), Err("failed"));
        assert_eq!(
            counter.get(),
            2,
            "ScopeRef should run its closure on the early-return path"
        );
    }
}
