//! Shared state behind every handle of one connection.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use switchboard_config::ConnConfig;
use tracing::debug;

use crate::error::ConnError;
use crate::framing::encode_frame;
use crate::lifecycle::{DoneSignal, DoneSignals, Lifecycle};
use crate::logger::{CONN_TARGET, ConnLogger, SharedLogger};
use crate::registry::{CommandHandler, CommandRegistry, CommandSet, Lookup};
use crate::transport::Transport;

/// State guarded by the connection lock.
struct State {
    registry: CommandRegistry,
    done: DoneSignals,
    logger: SharedLogger,
    lifecycle: Lifecycle,
}

/// Connection internals shared by the public handles and the dispatcher.
///
/// Registry, done signals, logger and lifecycle live under one lock. Raw
/// writes are serialised by a second lock so frames from concurrent writers
/// never interleave on the wire.
pub(crate) struct Core {
    state: Mutex<State>,
    write_lock: Mutex<()>,
    transport: Arc<dyn Transport>,
    config: ConnConfig,
}

impl Core {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        logger: SharedLogger,
        config: ConnConfig,
    ) -> Self {
        Self {
            state: Mutex::new(State {
                registry: CommandRegistry::new(),
                done: DoneSignals::default(),
                logger,
                lifecycle: Lifecycle::Active,
            }),
            write_lock: Mutex::new(()),
            transport,
            config,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) const fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub(crate) const fn config(&self) -> &ConnConfig {
        &self.config
    }

    pub(crate) fn logger(&self) -> SharedLogger {
        Arc::clone(&self.lock_state().logger)
    }

    pub(crate) fn set_logger(&self, logger: SharedLogger) {
        self.lock_state().logger = logger;
    }

    pub(crate) fn lifecycle(&self) -> Lifecycle {
        self.lock_state().lifecycle
    }

    pub(crate) fn add_command(&self, group: String, set: CommandSet) {
        self.lock_state().registry.add(group, set);
    }

    pub(crate) fn remove_group(&self, group: &str) {
        let (removed, logger) = {
            let mut state = self.lock_state();
            (state.registry.remove_group(group), Arc::clone(&state.logger))
        };
        if removed {
            logger.debug(format_args!("removed command group {group}"));
        }
    }

    pub(crate) fn remove_names<I, S>(&self, group: &str, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (removed, logger) = {
            let mut state = self.lock_state();
            (
                state.registry.remove_names(group, names),
                Arc::clone(&state.logger),
            )
        };
        for name in removed {
            logger.debug(format_args!("removed command {group}.{name}"));
        }
    }

    /// Looks up a handler for the dispatcher.
    ///
    /// Returns the handler with the logger current at lookup time. An unknown
    /// group is logged as a warning; an unknown name in a known group is not.
    pub(crate) fn resolve(&self, group: &str, name: &str) -> Option<(CommandHandler, SharedLogger)> {
        let (lookup, logger) = {
            let state = self.lock_state();
            (state.registry.lookup(group, name), Arc::clone(&state.logger))
        };
        match lookup {
            Lookup::Found(handler) => Some((handler, logger)),
            Lookup::UnknownCommand => None,
            Lookup::UnknownGroup => {
                logger.warn(format_args!("unknown command group: {group}.{name}"));
                None
            }
        }
    }

    /// Runs the handler for `group.name` on the calling thread.
    pub(crate) fn execute(&self, group: &str, name: &str, body: &[u8]) -> Result<(), ConnError> {
        let (lookup, logger) = {
            let state = self.lock_state();
            (state.registry.lookup(group, name), Arc::clone(&state.logger))
        };
        match lookup {
            Lookup::Found(handler) => handler(&*logger, body).map_err(ConnError::Handler),
            Lookup::UnknownGroup => Err(ConnError::group_not_found(group)),
            Lookup::UnknownCommand => Err(ConnError::command_not_found(group, name)),
        }
    }

    /// Sends one frame, best effort. Failures are logged and dropped.
    pub(crate) fn write_bytes(&self, payload: &[u8]) {
        if self.lifecycle() == Lifecycle::Destroyed {
            debug!(
                target: CONN_TARGET,
                bytes = payload.len(),
                "dropping write on destroyed connection"
            );
            return;
        }

        let frame = encode_frame(self.config.framing, payload);
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Err(error) = self
            .transport
            .write_with_deadline(&frame, self.config.write_deadline())
        {
            debug!(
                target: CONN_TARGET,
                %error,
                bytes = payload.len(),
                "dropped outbound frame"
            );
        }
    }

    pub(crate) fn done(&self) -> DoneSignal {
        let mut state = self.lock_state();
        let lifecycle = state.lifecycle;
        state.done.register(lifecycle)
    }

    /// Fires every done signal and closes the transport. Later calls do
    /// nothing.
    pub(crate) fn destroy(&self) {
        let (notified, logger) = {
            let mut state = self.lock_state();
            if state.lifecycle == Lifecycle::Destroyed {
                return;
            }
            state.lifecycle = Lifecycle::Destroyed;
            let notified = state.done.fire_all();
            if let Err(error) = self.transport.close() {
                debug!(target: CONN_TARGET, %error, "failed to close transport");
            }
            (notified, Arc::clone(&state.logger))
        };
        logger.debug(format_args!("connection destroyed, {notified} waiter(s) notified"));
    }
}

impl Drop for Core {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for Core {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock_state();
        f.debug_struct("Core")
            .field("lifecycle", &state.lifecycle)
            .field("groups", &state.registry.len())
            .field("waiters", &state.done.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
