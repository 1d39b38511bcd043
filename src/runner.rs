//! Cooperative loop driver (feature `embassy`).
//!
//! One iteration: let the engine run its pending jobs, then drain every
//! module, then yield to the executor for `period`. This task is the
//! only place the script engine is touched.

use embassy_time::{Duration, Timer};

use crate::engine::{PendingWork, ScriptEngine};
use crate::error::Error;
use crate::registry::ModuleRegistry;

/// Run the loop until the script ends, then tear every module down.
pub async fn run<E>(
    registry: &mut ModuleRegistry<E>,
    engine: &mut E,
    period: Duration,
) -> Result<(), Error>
where
    E: ScriptEngine + PendingWork,
{
    info!("script loop started ({} modules)", registry.len());

    loop {
        if !engine.run_pending() {
            break;
        }

        let report = registry.tick(engine);
        if report.total() > 0 {
            trace!(
                "tick: {} delivered, {} discarded",
                report.delivered,
                report.discarded
            );
        }

        Timer::after(period).await;
    }

    info!("script ended - shutting modules down");
    registry.shutdown()
}
