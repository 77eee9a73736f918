use crate::exec_log::ExecLog;
use crate::logging_driver::{DriverOp, LoggingConnection};

use std::sync::{Arc, Mutex, Once};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use trellis::{PersistenceContext, Session};
use trellis_driver_memory::Memory;

/// One test's database plus the log of every operation run against it.
pub struct DbTest {
    memory: Memory,
    ops: Arc<Mutex<Vec<DriverOp>>>,
}

impl DbTest {
    pub fn new() -> Self {
        init_tracing();

        Self {
            memory: Memory::new(),
            ops: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A context with the default configuration
    pub fn context(&self) -> PersistenceContext {
        PersistenceContext::builder().build()
    }

    /// Opens a session on the test database, after pushing the schema of
    /// `cx` to it.
    pub fn session(&mut self, cx: &PersistenceContext) -> Session {
        let connection = LoggingConnection::new(self.memory.clone(), self.ops.clone());
        let mut session = Session::new(connection);
        cx.push_schema(&mut session).expect("failed to push schema");
        self.ops.lock().unwrap().clear();
        session
    }

    /// Direct access to the stored rows
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn log(&self) -> ExecLog {
        ExecLog::new(self.ops.clone())
    }
}

impl Default for DbTest {
    fn default() -> Self {
        Self::new()
    }
}

/// Logs go to the test harness; `RUST_LOG` selects them.
fn init_tracing() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let env_filter = EnvFilter::builder()
            .with_default_directive(tracing::Level::WARN.into())
            .from_env_lossy();

        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}
