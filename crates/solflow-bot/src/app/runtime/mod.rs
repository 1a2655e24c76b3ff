mod entrypoints;
mod logging;
mod prelude;
mod runloop;

pub(crate) use entrypoints::{RuntimeEntrypointError, run, run_async};
use logging::init_tracing;
use prelude::*;
