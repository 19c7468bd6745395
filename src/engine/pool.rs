//! Session pooling.
//!
//! Sessions are handed out exclusively: a [`PooledSession`] belongs to one
//! caller until it is dropped, at which point it goes back to the pool. A
//! session whose planner switches could not be restored must be
//! [discarded](PooledSession::discard) instead so the switches never reach
//! the next caller.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};
use tracing::debug;

use super::config::EngineConfig;
use super::error::{EngineError, EngineResult};
use super::session::PlanEngine;

struct PoolState<S> {
    available: VecDeque<S>,
    created: usize,
}

struct SessionPoolInner<E: PlanEngine> {
    engine: E,
    config: EngineConfig,
    state: Mutex<PoolState<E::Session>>,
    released: Condvar,
}

/// Pool of engine sessions.
pub struct SessionPool<E: PlanEngine> {
    inner: Arc<SessionPoolInner<E>>,
}

impl<E: PlanEngine> Clone for SessionPool<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: PlanEngine> SessionPool<E> {
    /// Create a pool. Sessions are opened lazily, up to `config.max_sessions`.
    pub fn new(engine: E, config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(SessionPoolInner {
                engine,
                config,
                state: Mutex::new(PoolState {
                    available: VecDeque::new(),
                    created: 0,
                }),
                released: Condvar::new(),
            }),
        }
    }

    /// Check out a session, opening a new one if none is idle.
    ///
    /// When every session is checked out, waits up to
    /// `config.checkout_timeout` for one to be returned or discarded.
    pub fn get(&self) -> EngineResult<PooledSession<E>> {
        let deadline = Instant::now() + self.inner.config.checkout_timeout;
        let mut state = self.inner.state.lock();

        loop {
            if let Some(session) = state.available.pop_front() {
                return Ok(PooledSession {
                    session: Some(session),
                    pool: self.inner.clone(),
                });
            }

            if state.created < self.inner.config.max_sessions {
                break;
            }

            if self.inner.released.wait_until(&mut state, deadline).timed_out()
                && state.available.is_empty()
                && state.created >= self.inner.config.max_sessions
            {
                return Err(EngineError::PoolExhausted {
                    max_sessions: self.inner.config.max_sessions,
                });
            }
        }

        // Reserve a slot, then connect without holding the lock.
        state.created += 1;
        drop(state);

        match self.inner.engine.connect(&self.inner.config) {
            Ok(session) => {
                debug!(target_db = %self.inner.config.target(), "opened engine session");
                Ok(PooledSession {
                    session: Some(session),
                    pool: self.inner.clone(),
                })
            }
            Err(e) => {
                self.inner.state.lock().created -= 1;
                self.inner.released.notify_one();
                Err(e)
            }
        }
    }

    /// Number of idle sessions.
    pub fn available(&self) -> usize {
        self.inner.state.lock().available.len()
    }

    /// Number of open sessions, idle or checked out.
    pub fn created(&self) -> usize {
        self.inner.state.lock().created
    }

    /// The engine configuration sessions are opened with.
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// The engine sessions are opened against.
    pub fn engine(&self) -> &E {
        &self.inner.engine
    }
}

/// A session checked out of a [`SessionPool`].
pub struct PooledSession<E: PlanEngine> {
    session: Option<E::Session>,
    pool: Arc<SessionPoolInner<E>>,
}

impl<E: PlanEngine> PooledSession<E> {
    /// Close the session instead of returning it to the pool.
    pub fn discard(mut self) {
        if self.session.take().is_some() {
            self.pool.state.lock().created -= 1;
            self.pool.released.notify_one();
            debug!("discarded engine session");
        }
    }
}

impl<E: PlanEngine> Deref for PooledSession<E> {
    type Target = E::Session;

    fn deref(&self) -> &Self::Target {
        self.session.as_ref().expect("pooled session used after discard")
    }
}

impl<E: PlanEngine> DerefMut for PooledSession<E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.session.as_mut().expect("pooled session used after discard")
    }
}

impl<E: PlanEngine> Drop for PooledSession<E> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            self.pool.state.lock().available.push_back(session);
            self.pool.released.notify_one();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::engine::MemoryEngine;

    fn pool(max_sessions: usize) -> SessionPool<MemoryEngine> {
        SessionPool::new(
            MemoryEngine::new(),
            EngineConfig::default()
                .max_sessions(max_sessions)
                .checkout_timeout(Duration::from_millis(50)),
        )
    }

    #[test]
    fn test_sessions_open_lazily() {
        let pool = pool(5);
        assert_eq!(pool.created(), 0);

        let _session = pool.get().unwrap();
        assert_eq!(pool.created(), 1);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_pool_reuse() {
        let pool = pool(5);

        {
            let _s1 = pool.get().unwrap();
            let _s2 = pool.get().unwrap();
            assert_eq!(pool.created(), 2);
        }

        // Sessions returned to pool.
        assert_eq!(pool.available(), 2);

        let _s3 = pool.get().unwrap();
        assert_eq!(pool.created(), 2);
        assert_eq!(pool.engine().connections(), 2);
    }

    #[test]
    fn test_pool_exhausted() {
        let pool = pool(1);
        let _held = pool.get().unwrap();

        let started = Instant::now();
        assert!(matches!(
            pool.get(),
            Err(EngineError::PoolExhausted { max_sessions: 1 })
        ));
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_get_waits_for_returned_session() {
        let pool = SessionPool::new(
            MemoryEngine::new(),
            EngineConfig::default()
                .max_sessions(1)
                .checkout_timeout(Duration::from_secs(10)),
        );
        let held = pool.get().unwrap();

        std::thread::scope(|s| {
            let waiter = s.spawn(|| pool.get().map(|_| ()));
            std::thread::sleep(Duration::from_millis(20));
            drop(held);
            assert!(waiter.join().unwrap().is_ok());
        });

        assert_eq!(pool.created(), 1);
        assert_eq!(pool.engine().connections(), 1);
    }

    #[test]
    fn test_get_waits_for_discarded_slot() {
        let pool = SessionPool::new(
            MemoryEngine::new(),
            EngineConfig::default()
                .max_sessions(1)
                .checkout_timeout(Duration::from_secs(10)),
        );
        let held = pool.get().unwrap();

        std::thread::scope(|s| {
            let waiter = s.spawn(|| pool.get().map(|_| ()));
            std::thread::sleep(Duration::from_millis(20));
            held.discard();
            assert!(waiter.join().unwrap().is_ok());
        });

        // The waiter opened a replacement session.
        assert_eq!(pool.engine().connections(), 2);
    }

    #[test]
    fn test_discard_frees_slot() {
        let pool = pool(1);
        pool.get().unwrap().discard();

        assert_eq!(pool.created(), 0);
        assert_eq!(pool.available(), 0);

        let _fresh = pool.get().unwrap();
        assert_eq!(pool.engine().connections(), 2);
    }

    #[test]
    fn test_connect_failure_releases_slot() {
        let pool = SessionPool::new(
            MemoryEngine::new().refuse_connections(),
            EngineConfig::default().max_sessions(1),
        );

        assert!(matches!(pool.get(), Err(EngineError::Connect { .. })));
        assert_eq!(pool.created(), 0);
    }
}
