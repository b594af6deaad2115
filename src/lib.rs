//! Downstream Respond Filter for Envoy Proxy
//!
//! This network filter takes every chunk of data arriving from the
//! downstream connection out of the buffer, hands it to the foreign
//! function `respond` as a `RespondArguments` protobuf message, and stops
//! the filter chain. What the client gets back is entirely up to the
//! foreign function.
//!
//! Targets: wasm32-wasi (Envoy proxy-wasm ABI)

use std::rc::Rc;

use log::{error, info};
use proxy_wasm::traits::{Context, RootContext, StreamContext};
use proxy_wasm::types::{ContextType, LogLevel};

pub mod codec;
pub mod config;
pub mod error;
pub mod host;
pub mod stream;
pub mod telemetry;

use config::FilterConfig;
use host::{HostBuffer, HostForeignCall};
use stream::RespondStreamContext;

/// Root context for filter lifecycle management
pub struct RespondRootContext {
    config: Rc<FilterConfig>,
}

impl RespondRootContext {
    pub fn new() -> Self {
        Self {
            config: Rc::new(FilterConfig::default()),
        }
    }

    /// Build the context for one downstream connection
    pub fn new_stream_context(
        &self,
        context_id: u32,
    ) -> RespondStreamContext<HostBuffer, HostForeignCall> {
        RespondStreamContext::new(
            context_id,
            Rc::clone(&self.config),
            HostBuffer,
            HostForeignCall,
        )
    }
}

impl Default for RespondRootContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Context for RespondRootContext {}

impl RootContext for RespondRootContext {
    fn on_configure(&mut self, _plugin_configuration_size: usize) -> bool {
        let plugin_configuration = self.get_plugin_configuration();
        let config = match FilterConfig::from_plugin_configuration(plugin_configuration.as_deref()) {
            Ok(config) => config,
            Err(e) => {
                error!("Rejecting filter configuration: {}", e);
                return false;
            }
        };

        proxy_wasm::set_log_level(config.log_level.into());

        info!(
            "Respond filter initialized, forwarding downstream data to '{}'",
            config.function_name
        );

        self.config = Rc::new(config);
        true
    }

    fn create_stream_context(&self, context_id: u32) -> Option<Box<dyn StreamContext>> {
        Some(Box::new(self.new_stream_context(context_id)))
    }

    fn get_type(&self) -> Option<ContextType> {
        Some(ContextType::StreamContext)
    }
}

// Register the filter with proxy-wasm runtime
proxy_wasm::main! {{
    proxy_wasm::set_log_level(LogLevel::Info);
    proxy_wasm::set_root_context(|_| -> Box<dyn RootContext> {
        Box::new(RespondRootContext::new())
    });
}}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_reports_stream_contexts() {
        let root = RespondRootContext::new();
        assert!(matches!(root.get_type(), Some(ContextType::StreamContext)));
        assert_eq!(root.config.function_name, config::RESPOND_FUNCTION);
    }

    #[test]
    fn test_stream_contexts_share_root_config() {
        let root = RespondRootContext::new();

        let first = root.new_stream_context(2);
        let second = root.new_stream_context(3);

        assert_eq!(first.context_id(), 2);
        assert_eq!(second.context_id(), 3);
        assert_eq!(Rc::strong_count(&root.config), 3);
        assert_eq!(first.stats(), stream::StreamStats::default());
    }
}
