// ABOUTME: Test support utilities.
// ABOUTME: Provides a recording fake process runner and engine/host helpers.

use std::sync::Arc;

// Each test binary only uses some of these modules, so allow dead_code.
#[allow(dead_code)]
pub mod fake_runner;

use containmint::commands::Host;
use containmint::engine::{ContainerEngine, EngineKind, EngineProgram};
use fake_runner::FakeRunner;

/// An engine with a pre-resolved program backed by `runner`.
#[allow(dead_code)]
pub fn engine(runner: &Arc<FakeRunner>, kind: EngineKind) -> ContainerEngine {
    let path = format!("/usr/bin/{}", kind.program_name());
    ContainerEngine::with_program(runner.clone(), EngineProgram::new(kind, path))
}

/// A host whose engine and processes are all served by `runner`.
#[allow(dead_code)]
pub fn host(runner: &Arc<FakeRunner>, kind: EngineKind) -> Host {
    Host::with_engine(runner.clone(), engine(runner, kind))
}

/// Run a future to completion on a fresh current-thread runtime.
///
/// Used inside `temp_env` closures, which are synchronous.
#[allow(dead_code)]
pub fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}
