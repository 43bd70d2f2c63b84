use crate::cell::{Deferred, adopt};

use tracing::debug;

impl<T, E> Deferred<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Settles like the first input to settle, fulfilled or rejected.
    ///
    /// Every input is observed; later settlements are ignored. With no
    /// inputs the returned cell never settles. The output shares the
    /// configuration of the first input.
    pub fn race<I>(cells: I) -> Deferred<T, E>
    where
        I: IntoIterator<Item = Deferred<T, E>>,
    {
        let cells: Vec<_> = cells.into_iter().collect();

        let Some(first) = cells.first() else {
            debug!("race over no inputs, the result will never settle");
            return Deferred::new(|_, _| Ok(()));
        };

        first.derive(|resolver, rejecter| {
            for cell in &cells {
                adopt(cell, resolver.clone(), rejecter.clone());
            }
            Ok(())
        })
    }
}
