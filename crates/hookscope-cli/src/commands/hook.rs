//! Hook command implementation.

use std::io::Read;
use std::time::Duration;

use clap::Parser;
use hookscope_capture::{HookInput, HookKind, Telemetry};
use hookscope_common_log::spans::{hook_span, Timer};
use tracing::{debug, warn, Instrument};

use crate::cli::CommandContext;
use crate::error::CliError;

/// How long the session-end flush may run after the event is written before
/// the process exits anyway.
const SESSION_END_GRACE: Duration = Duration::from_secs(3);

/// Per-event hooks sit on the host's critical path; a slow webhook is
/// abandoned after this.
const EVENT_GRACE: Duration = Duration::from_millis(200);

fn settle_grace(kind: HookKind) -> Duration {
    match kind {
        HookKind::SessionEnd => SESSION_END_GRACE,
        _ => EVENT_GRACE,
    }
}

/// Handle one host hook
#[derive(Debug, Parser)]
pub struct HookCommand {
    /// Hook kind, e.g. `pre-tool-use` or `session-end`
    pub kind: HookKind,
}

impl HookCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let mut raw = String::new();
        if let Err(e) = std::io::stdin().read_to_string(&mut raw) {
            warn!(error = %e, "failed to read hook input, using defaults");
        }
        let input = HookInput::parse(&raw);

        let span = hook_span(self.kind.as_str(), &input.session_id);
        let telemetry = Telemetry::open(ctx.paths.clone());

        let result = span.in_scope(|| {
            let timer = Timer::start("hook");
            let result = telemetry.handle(self.kind, &input);
            timer.finish();
            result
        });

        let abandoned = telemetry.settle(settle_grace(self.kind)).instrument(span).await;
        if abandoned > 0 {
            debug!(abandoned, "background work abandoned at exit");
        }

        // Hosts treat exit code 2 as "block this action", so a failed write
        // always surfaces as a general error.
        result.map(|_| ()).map_err(|e| {
            CliError::Other(anyhow::Error::new(e).context(format!("failed to record {} hook", self.kind)))
        })
    }
}
