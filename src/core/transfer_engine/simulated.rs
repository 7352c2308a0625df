use crate::core::transfer_engine::{TransferEngine, TransferRequest, TransferResult};
use anyhow::{Result, bail};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

/// Records every request instead of writing anything.
#[derive(Clone, Default)]
pub struct SimulatedEngine {
    requests: Arc<Mutex<Vec<TransferRequest>>>,
    pub fail: bool,
}

impl SimulatedEngine {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<TransferRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl TransferEngine for SimulatedEngine {
    fn transfer(
        &self,
        req: &TransferRequest,
    ) -> Pin<Box<dyn Future<Output = Result<TransferResult>> + Send>> {
        self.requests.lock().unwrap().push(req.clone());
        let fail = self.fail;

        Box::pin(async move {
            if fail {
                bail!("simulated dd failure");
            }
            Ok(TransferResult { duration_secs: 0 })
        })
    }
}
