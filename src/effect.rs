//! Deferred, environment-parameterized asynchronous computations
//!
//! An [`Effect`] is a description of work, not the work itself. It needs an
//! environment (`Arc<E>`) to run and resolves to `Result<T, X>`. Effects are
//! cheap to clone and can be run any number of times; every [`Effect::run`]
//! re-executes all underlying I/O.
//!
//! # Examples
//!
//! ```
//! use circleci_weigh_in::effect::Effect;
//! use std::sync::Arc;
//!
//! struct Env {
//!     base: u64,
//! }
//!
//! let total: Effect<Env, u64, String> = Effect::ask()
//!     .map(|env: Arc<Env>| env.base)
//!     .chain(|base| Effect::of(base * 2));
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let result = runtime.block_on(total.run(Arc::new(Env { base: 21 })));
//! assert_eq!(result, Ok(42));
//! ```

use futures::future::{self, BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;

type Thunk<E, T, X> = dyn Fn(Arc<E>) -> BoxFuture<'static, Result<T, X>> + Send + Sync;

/// A composable, re-runnable asynchronous computation over an environment `E`
pub struct Effect<E, T, X> {
    thunk: Arc<Thunk<E, T, X>>,
}

impl<E, T, X> Clone for Effect<E, T, X> {
    fn clone(&self) -> Self {
        Self {
            thunk: Arc::clone(&self.thunk),
        }
    }
}

impl<E, T, X> Effect<E, T, X>
where
    E: Send + Sync + 'static,
    T: Send + 'static,
    X: Send + 'static,
{
    /// Wrap a raw environment function as an effect
    pub fn from_env_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, X>> + Send + 'static,
    {
        Self {
            thunk: Arc::new(move |env: Arc<E>| f(env).boxed()),
        }
    }

    /// An effect that succeeds immediately with `value`
    pub fn of(value: T) -> Self
    where
        T: Clone + Sync,
    {
        Self::from_env_fn(move |_| future::ready(Ok(value.clone())))
    }

    /// An effect that fails immediately with `err`
    pub fn from_error(err: X) -> Self
    where
        X: Clone + Sync,
    {
        Self::from_env_fn(move |_| future::ready(Err(err.clone())))
    }

    /// Transform the success value
    ///
    /// `f` is never called when this effect fails.
    pub fn map<U, F>(self, f: F) -> Effect<E, U, X>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let thunk = self.thunk;
        let f = Arc::new(f);
        Effect::from_env_fn(move |env| {
            let pending = thunk(env);
            let f = Arc::clone(&f);
            async move { pending.await.map(|value| (*f)(value)) }
        })
    }

    /// Transform the success value with a fallible function
    pub fn try_map<U, F>(self, f: F) -> Effect<E, U, X>
    where
        U: Send + 'static,
        F: Fn(T) -> Result<U, X> + Send + Sync + 'static,
    {
        let thunk = self.thunk;
        let f = Arc::new(f);
        Effect::from_env_fn(move |env| {
            let pending = thunk(env);
            let f = Arc::clone(&f);
            async move { pending.await.and_then(|value| (*f)(value)) }
        })
    }

    /// Transform the failure value
    pub fn map_err<Y, F>(self, f: F) -> Effect<E, T, Y>
    where
        Y: Send + 'static,
        F: Fn(X) -> Y + Send + Sync + 'static,
    {
        let thunk = self.thunk;
        let f = Arc::new(f);
        Effect::from_env_fn(move |env| {
            let pending = thunk(env);
            let f = Arc::clone(&f);
            async move { pending.await.map_err(|err| (*f)(err)) }
        })
    }

    /// Sequence another effect that depends on this one's success value
    ///
    /// The continuation runs against the same environment. On failure the
    /// continuation is never invoked and the failure propagates unchanged.
    pub fn chain<U, F>(self, f: F) -> Effect<E, U, X>
    where
        U: Send + 'static,
        F: Fn(T) -> Effect<E, U, X> + Send + Sync + 'static,
    {
        let thunk = self.thunk;
        let f = Arc::new(f);
        Effect::from_env_fn(move |env: Arc<E>| {
            let pending = thunk(Arc::clone(&env));
            let f = Arc::clone(&f);
            async move {
                let value = pending.await?;
                let next = (*f)(value);
                next.run(env).await
            }
        })
    }

    /// Execute the computation against `env`
    pub fn run(&self, env: Arc<E>) -> BoxFuture<'static, Result<T, X>> {
        (self.thunk)(env)
    }
}

impl<E, X> Effect<E, Arc<E>, X>
where
    E: Send + Sync + 'static,
    X: Send + 'static,
{
    /// An effect that yields the environment it is run against
    pub fn ask() -> Self {
        Self::from_env_fn(|env| future::ready(Ok(env)))
    }
}

impl<E, T, D, X> Effect<E, Result<T, D>, X>
where
    E: Send + Sync + 'static,
    T: Send + 'static,
    D: Into<X> + Send + 'static,
    X: Send + 'static,
{
    /// Turn a domain failure carried in the success channel into a failure
    /// of the effect itself
    pub fn escalate(self) -> Effect<E, T, X> {
        self.try_map(|outcome| outcome.map_err(Into::into))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Probe {
        calls: AtomicUsize,
        seen: Mutex<Vec<usize>>,
    }

    impl Probe {
        fn address(&self) -> usize {
            self as *const Probe as usize
        }
    }

    fn counting() -> Effect<Probe, usize, String> {
        Effect::from_env_fn(|env: Arc<Probe>| async move {
            Ok(env.calls.fetch_add(1, Ordering::SeqCst) + 1)
        })
    }

    #[tokio::test]
    async fn test_of_resolves_to_value() {
        let effect: Effect<Probe, i32, String> = Effect::of(7);
        assert_eq!(effect.run(Arc::new(Probe::default())).await, Ok(7));
    }

    #[tokio::test]
    async fn test_from_error_rejects_with_error() {
        let effect: Effect<Probe, i32, String> = Effect::from_error("boom".to_string());
        assert_eq!(
            effect.run(Arc::new(Probe::default())).await,
            Err("boom".to_string())
        );
    }

    #[tokio::test]
    async fn test_map_transforms_success_value() {
        let effect = counting().map(|n| n * 10);
        assert_eq!(effect.run(Arc::new(Probe::default())).await, Ok(10));
    }

    #[tokio::test]
    async fn test_failure_short_circuits_map_and_chain() {
        let invoked = Arc::new(AtomicUsize::new(0));
        let map_count = Arc::clone(&invoked);
        let chain_count = Arc::clone(&invoked);

        let effect: Effect<Probe, i32, String> = Effect::<Probe, i32, String>::from_error(
            "original".to_string(),
        )
        .map(move |n| {
            map_count.fetch_add(1, Ordering::SeqCst);
            n + 1
        })
        .chain(move |n| {
            chain_count.fetch_add(1, Ordering::SeqCst);
            Effect::of(n)
        });

        let result = effect.run(Arc::new(Probe::default())).await;

        assert_eq!(result, Err("original".to_string()));
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_chain_passes_identical_environment_to_every_stage() {
        let record = |env: Arc<Probe>| {
            let address = env.address();
            env.seen.lock().unwrap().push(address);
            async move { Ok::<_, String>(address) }
        };

        let effect = Effect::from_env_fn(record)
            .chain(move |_| Effect::from_env_fn(record))
            .chain(move |_| Effect::from_env_fn(record));

        let env = Arc::new(Probe::default());
        let last = effect.run(Arc::clone(&env)).await.unwrap();

        let seen = env.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|address| *address == env.address()));
        assert_eq!(last, env.address());
    }

    #[tokio::test]
    async fn test_run_reexecutes_io_each_time() {
        let effect = counting();
        let env = Arc::new(Probe::default());

        assert_eq!(effect.run(Arc::clone(&env)).await, Ok(1));
        assert_eq!(effect.run(Arc::clone(&env)).await, Ok(2));
        assert_eq!(env.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_same_effect_runs_against_different_environments() {
        let effect = counting();
        let first = Arc::new(Probe::default());
        let second = Arc::new(Probe::default());

        effect.run(Arc::clone(&first)).await.unwrap();
        effect.run(Arc::clone(&second)).await.unwrap();
        effect.run(Arc::clone(&second)).await.unwrap();

        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_try_map_failure_stops_chain() {
        let effect = counting()
            .try_map(|_| Err::<usize, _>("decode failed".to_string()))
            .chain(|_| Effect::of(0));

        assert_eq!(
            effect.run(Arc::new(Probe::default())).await,
            Err("decode failed".to_string())
        );
    }

    #[tokio::test]
    async fn test_escalate_moves_domain_failure_into_error_channel() {
        let found: Effect<Probe, Result<u8, String>, String> = Effect::of(Ok(3));
        let missing: Effect<Probe, Result<u8, String>, String> =
            Effect::of(Err("no builds".to_string()));

        let env = Arc::new(Probe::default());
        assert_eq!(found.escalate().run(Arc::clone(&env)).await, Ok(3));
        assert_eq!(
            missing.escalate().run(env).await,
            Err("no builds".to_string())
        );
    }

    #[tokio::test]
    async fn test_map_err_only_touches_failures() {
        let ok: Effect<Probe, u8, String> = Effect::of(1);
        let failed: Effect<Probe, u8, String> = Effect::from_error("x".to_string());

        let env = Arc::new(Probe::default());
        assert_eq!(ok.map_err(|e| e.len()).run(Arc::clone(&env)).await, Ok(1));
        assert_eq!(failed.map_err(|e| e.len()).run(env).await, Err(1));
    }
}
