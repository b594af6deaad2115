//! Per-connection stream context
//!
//! Every downstream data event runs the same sequence: snapshot the
//! buffer, drain it, wrap the bytes in a [`RespondArguments`] message,
//! call the foreign function, release whatever it returned and stop the
//! filter chain. Nothing but statistics survives from one event to the
//! next.
//!
//! [`RespondArguments`]: crate::codec::RespondArguments

use std::rc::Rc;

use log::{debug, info};
use proxy_wasm::traits::{Context, StreamContext};
use proxy_wasm::types::{Action, BufferType};

use crate::codec;
use crate::config::FilterConfig;
use crate::error::FilterError;
use crate::host::{BufferAccessor, CallStatus, ForeignCallInvoker};
use crate::telemetry;

/// What the host should do with the rest of the filter chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Continue,
    StopIteration,
}

impl From<Disposition> for Action {
    fn from(disposition: Disposition) -> Self {
        match disposition {
            Disposition::Continue => Action::Continue,
            Disposition::StopIteration => Action::Pause,
        }
    }
}

/// Running totals for one stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub events: u64,
    pub bytes_intercepted: u64,
    pub bytes_returned: u64,
}

/// Stream context handing downstream bytes to a foreign function
pub struct RespondStreamContext<B, F> {
    context_id: u32,
    config: Rc<FilterConfig>,
    buffer: B,
    foreign: F,
    stats: StreamStats,
}

impl<B, F> RespondStreamContext<B, F>
where
    B: BufferAccessor,
    F: ForeignCallInvoker,
{
    pub fn new(context_id: u32, config: Rc<FilterConfig>, buffer: B, foreign: F) -> Self {
        Self {
            context_id,
            config,
            buffer,
            foreign,
            stats: StreamStats::default(),
        }
    }

    pub fn context_id(&self) -> u32 {
        self.context_id
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Run one data event to completion.
    ///
    /// Any error leaves the event half done (the buffer may already be
    /// drained), so callers must not continue the stream after one.
    pub fn handle_downstream_data(
        &mut self,
        data_size: usize,
        end_of_stream: bool,
    ) -> Result<Disposition, FilterError> {
        info!(
            "[context_id={}] received data from downstream, sending it back...",
            self.context_id
        );
        debug!(
            "[context_id={}] data_size: {}, end_of_stream: {}",
            self.context_id, data_size, end_of_stream
        );

        let snapshot = self
            .buffer
            .read(BufferType::DownstreamData, 0, data_size)?;
        if snapshot.len() != data_size {
            debug!(
                "[context_id={}] host returned {} of {} bytes",
                self.context_id,
                snapshot.len(),
                data_size
            );
        }

        self.buffer
            .drain(BufferType::DownstreamData, 0, data_size)?;

        let intercepted = snapshot.len();
        let request = codec::encode(snapshot.into_bytes());

        let function = self.config.function_name.as_str();
        debug!(
            "[context_id={}] calling {} with {} byte request",
            self.context_id,
            function,
            request.len()
        );
        let result = self.foreign.invoke(function, &request);
        let output_len = result.output.as_ref().map(|output| output.len());

        if let CallStatus::Error(status) = result.status {
            // output, if any, is released when `result` drops
            return Err(FilterError::ForeignCallFailed {
                function: function.to_string(),
                status,
            });
        }
        if let Some(output) = result.output {
            output.release();
        }

        self.stats.events += 1;
        self.stats.bytes_intercepted += intercepted as u64;
        self.stats.bytes_returned += output_len.unwrap_or(0) as u64;

        if self.config.audit {
            telemetry::audit_intercepted(self.context_id, function, intercepted, output_len)
                .emit();
        }

        Ok(Disposition::StopIteration)
    }

    fn abort(&self, data_size: usize, err: FilterError) -> ! {
        if self.config.audit {
            telemetry::audit_aborted(self.context_id, data_size, err.kind(), &err.to_string())
                .emit();
        }
        panic!("[context_id={}] {}", self.context_id, err)
    }
}

impl<B, F> Context for RespondStreamContext<B, F> {}

impl<B, F> StreamContext for RespondStreamContext<B, F>
where
    B: BufferAccessor,
    F: ForeignCallInvoker,
{
    fn on_downstream_data(&mut self, data_size: usize, end_of_stream: bool) -> Action {
        match self.handle_downstream_data(data_size, end_of_stream) {
            Ok(disposition) => disposition.into(),
            Err(err) => self.abort(data_size, err),
        }
    }

    fn on_log(&mut self) {
        if self.config.audit {
            telemetry::audit_summary(
                self.context_id,
                self.stats.events,
                self.stats.bytes_intercepted,
                self.stats.bytes_returned,
            )
            .emit();
        }
    }
}
