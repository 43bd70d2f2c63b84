use super::core::Deferred;
use super::settle::{Rejecter, Resolver};

/// What a reaction handler hands to the cell returned by `then`.
///
/// A plain value settles that cell directly. A `Deferred` is followed
/// instead: the cell settles with whatever the returned cell eventually
/// settles with.
pub enum Resolution<T, E>
where
    T: 'static,
    E: 'static,
{
    Value(T),
    Deferred(Deferred<T, E>),
}

impl<T: 'static, E: 'static> From<Deferred<T, E>> for Resolution<T, E> {
    fn from(deferred: Deferred<T, E>) -> Self {
        Resolution::Deferred(deferred)
    }
}

/// Default success handler: pass the value through.
pub(crate) fn identity<T: 'static, E: 'static>(value: T) -> Result<Resolution<T, E>, E> {
    Ok(Resolution::Value(value))
}

/// Default failure handler: raise the reason again.
pub(crate) fn rethrow<U: 'static, E: 'static>(reason: E) -> Result<Resolution<U, E>, E> {
    Err(reason)
}

/// Runs `handler` on a settled input and settles the consumer cell behind
/// `resolver`/`rejecter` with its outcome.
pub(crate) fn run<V, U, E, H>(handler: H, input: V, resolver: Resolver<U, E>, rejecter: Rejecter<U, E>)
where
    U: Clone + Send + 'static,
    E: Clone + Send + 'static,
    H: FnOnce(V) -> Result<Resolution<U, E>, E>,
{
    let produced = resolver.config().guard(move || handler(input));

    match produced {
        Ok(Resolution::Value(value)) => {
            resolver.resolve(value);
        }
        Ok(Resolution::Deferred(next)) => adopt(&next, resolver, rejecter),
        Err(reason) => {
            rejecter.reject(reason);
        }
    }
}

/// Makes the consumer cell settle with whatever `source` settles with.
///
/// The forwarding closures must not be generic over a handler type, or
/// instantiating `run` would recurse without bound.
pub(crate) fn adopt<U, E>(source: &Deferred<U, E>, resolver: Resolver<U, E>, rejecter: Rejecter<U, E>)
where
    U: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    source.then(
        move |value| {
            resolver.resolve(value);
            Ok(Resolution::Value(()))
        },
        move |reason| {
            rejecter.reject(reason);
            Ok(Resolution::Value(()))
        },
    );
}
