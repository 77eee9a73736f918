use std::sync::{Arc, Mutex};
use trellis_core::{
    driver::{Capability, Connection, Operation, Response, Rows},
    schema::db::Schema,
    Result,
};

#[derive(Debug)]
pub struct DriverOp {
    pub operation: Operation,

    /// Failed operations are logged with their error
    pub response: Result<Response>,
}

/// A connection wrapper that logs all operations for testing purposes
#[derive(Debug)]
pub struct LoggingConnection {
    /// The underlying connection that actually executes operations
    inner: Box<dyn Connection>,

    /// Log of all operations executed through this connection
    ops_log: Arc<Mutex<Vec<DriverOp>>>,
}

impl LoggingConnection {
    pub fn new(inner: impl Connection + 'static, ops_log: Arc<Mutex<Vec<DriverOp>>>) -> Self {
        Self {
            inner: Box::new(inner),
            ops_log,
        }
    }
}

impl Connection for LoggingConnection {
    fn capability(&self) -> &'static Capability {
        self.inner.capability()
    }

    fn push_schema(&mut self, schema: &Schema) -> Result<()> {
        self.inner.push_schema(schema)
    }

    fn exec(&mut self, operation: Operation) -> Result<Response> {
        let operation_clone = operation.clone();
        let response = self.inner.exec(operation);

        let driver_op = DriverOp {
            operation: operation_clone,
            response: match &response {
                Ok(response) => Ok(duplicate_response(response)),
                Err(err) => Err(err.clone()),
            },
        };

        self.ops_log
            .lock()
            .expect("Failed to acquire ops log lock")
            .push(driver_op);

        response
    }
}

fn duplicate_response(response: &Response) -> Response {
    let rows = match &response.rows {
        Rows::Count(count) => Rows::Count(*count),
        Rows::Values(values) => Rows::Values(values.clone()),
    };

    Response { rows }
}
