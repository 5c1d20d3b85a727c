//! Background read loop routing inbound envelopes to handlers.
//!
//! Each connection runs one dispatcher thread. It pulls frames from the
//! transport, decodes them, resolves `group.name` against the registry and
//! runs the handler on its own thread so a slow handler never stalls the
//! reads that follow. Handler fan-out is capped per connection; once the cap
//! is reached the loop waits for a handler to finish before reading on.
//!
//! Decode failures are logged to the process log sink and skipped. End of
//! stream or a read failure destroys the connection and ends the thread.

mod limiter;

use std::sync::{Arc, Weak};
use std::thread;

use tracing::{debug, warn};

use crate::connection::Core;
use crate::error::ConnError;
use crate::framing::FrameReader;
use crate::logger::{ConnLogger, SharedLogger};
use crate::protocol::InboundMessage;
use crate::registry::CommandHandler;
use crate::transport::Transport;

use self::limiter::{HandlerLimiter, HandlerPermit};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Bytes of an undecodable frame echoed into the log.
const PREVIEW_BYTES: usize = 256;

/// Starts the dispatcher thread for `core`.
///
/// The thread keeps only a weak reference to the connection, so dropping
/// every connection handle tears the connection down.
pub(crate) fn spawn_dispatcher(core: &Arc<Core>) -> Result<(), ConnError> {
    let weak = Arc::downgrade(core);
    let transport = Arc::clone(core.transport());
    let mut reader = FrameReader::new(core.config());
    let limiter = HandlerLimiter::new(core.config().max_in_flight_handlers);

    thread::Builder::new()
        .name("switchboard-dispatch".to_owned())
        .spawn(move || run(&weak, transport.as_ref(), &mut reader, &limiter))
        .map(drop)
        .map_err(|source| ConnError::spawn("dispatcher", source))
}

fn run(
    core: &Weak<Core>,
    transport: &dyn Transport,
    reader: &mut FrameReader,
    limiter: &Arc<HandlerLimiter>,
) {
    loop {
        match reader.next_frame(transport) {
            Ok(Some(frame)) => {
                let Some(live) = core.upgrade() else {
                    break;
                };
                dispatch_frame(&live, &frame, limiter);
            }
            Ok(None) => {
                debug!(target: DISPATCH_TARGET, "transport reached end of stream");
                teardown(core);
                break;
            }
            Err(error) => {
                debug!(target: DISPATCH_TARGET, %error, "transport read failed");
                teardown(core);
                break;
            }
        }
    }
    debug!(target: DISPATCH_TARGET, "dispatcher stopped");
}

fn teardown(core: &Weak<Core>) {
    if let Some(live) = core.upgrade() {
        live.destroy();
    }
}

/// Decodes one frame and launches the matching handler, if any.
pub(crate) fn dispatch_frame(core: &Core, frame: &[u8], limiter: &Arc<HandlerLimiter>) {
    let message = match InboundMessage::decode(frame) {
        Ok(message) => message,
        Err(error) => {
            warn!(
                target: DISPATCH_TARGET,
                %error,
                frame = %preview(frame),
                "failed to decode inbound envelope"
            );
            return;
        }
    };

    if message.group().is_empty() {
        return;
    }

    let Some((handler, logger)) = core.resolve(message.group(), message.name()) else {
        return;
    };

    let permit = limiter.acquire();
    launch(handler, logger, message, permit);
}

fn launch(
    handler: CommandHandler,
    logger: SharedLogger,
    message: InboundMessage,
    permit: HandlerPermit,
) {
    let spawned = thread::Builder::new()
        .name("switchboard-handler".to_owned())
        .spawn(move || {
            let _permit = permit;
            if let Err(error) = handler(&*logger, message.body()) {
                logger.debug(format_args!("{}: {error:#}", message.qualified_name()));
            }
        });

    if let Err(error) = spawned {
        warn!(target: DISPATCH_TARGET, %error, "failed to spawn handler thread");
    }
}

fn preview(frame: &[u8]) -> String {
    let shown = frame.get(..PREVIEW_BYTES).unwrap_or(frame);
    String::from_utf8_lossy(shown).into_owned()
}
