use crate::cell::{Deferred, Resolution};

use std::sync::Arc;

use parking_lot::Mutex;

/// Results collected so far by one `all` call.
struct Gathered<T> {
    /// One slot per input, addressed by input position.
    results: Vec<Option<T>>,

    /// Number of inputs that have fulfilled.
    fulfilled: usize,
}

impl<T> Gathered<T> {
    /// Stores `value` at `index`; returns every result, in input order, once
    /// the last slot is filled.
    fn store(&mut self, index: usize, value: T) -> Option<Vec<T>> {
        self.results[index] = Some(value);
        self.fulfilled += 1;

        if self.fulfilled < self.results.len() {
            return None;
        }

        Some(self.results.iter_mut().filter_map(Option::take).collect())
    }
}

impl<T, E> Deferred<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Waits for every input and fulfils with their values in input order.
    ///
    /// Reactions are attached to all inputs up front. The output rejects as
    /// soon as any input rejects; later outcomes have no further effect. An
    /// empty input fulfils immediately with an empty vector.
    ///
    /// The output shares the configuration of the first input.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use deferred::Deferred;
    ///
    /// let (late, settle_late) = {
    ///     let mut capability = None;
    ///     let d = Deferred::<i32, String>::new(|resolve, _| {
    ///         capability = Some(resolve);
    ///         Ok(())
    ///     });
    ///     (d, capability.unwrap())
    /// };
    ///
    /// let both = Deferred::all([late, Deferred::resolve(2)]);
    /// settle_late.resolve(1);
    ///
    /// assert_eq!(both.wait(), Ok(vec![1, 2]));
    /// ```
    pub fn all<I>(cells: I) -> Deferred<Vec<T>, E>
    where
        I: IntoIterator<Item = Deferred<T, E>>,
    {
        let cells: Vec<_> = cells.into_iter().collect();

        let Some(first) = cells.first() else {
            return Deferred::resolve(Vec::new());
        };

        first.derive(|resolver, rejecter| {
            let gathered = Arc::new(Mutex::new(Gathered {
                results: vec![None; cells.len()],
                fulfilled: 0,
            }));

            for (index, cell) in cells.iter().enumerate() {
                let gathered = gathered.clone();
                let resolver = resolver.clone();
                let rejecter = rejecter.clone();

                cell.then(
                    move |value| {
                        let complete = gathered.lock().store(index, value);
                        if let Some(values) = complete {
                            resolver.resolve(values);
                        }
                        Ok(Resolution::Value(()))
                    },
                    move |reason| {
                        rejecter.reject(reason);
                        Ok(Resolution::Value(()))
                    },
                );
            }

            Ok(())
        })
    }
}
