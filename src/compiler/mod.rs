//! Nuitka invocation: building the command and running it.

mod command;
mod executor;

pub use command::{
    CommandBuilder, CompilerInvocation, Flag, JIT_MODULE_PARAMETER, NOFOLLOW_IMPORTS, jit_flag,
    synthesize,
};
pub use executor::{
    BuildExecutor, BuildResult, Captured, RunError, STREAM_CHANNEL_CAPACITY, StreamLine,
    StreamOrigin, TERMINATED_BY_SIGNAL, WARNINGS_ENV_VAR, exit_code, locate_binary, run_blocking,
    run_streaming, termination_signal, wait_failure,
};
