pub mod mock_bridge;
pub mod mock_inference;
pub mod mock_ollama;

use rephrase::services::{Service, ServiceContext};

pub use mock_bridge::{BridgeCall, MockBridge};
pub use mock_inference::{MockInference, MockReply};
pub use mock_ollama::{MockOllama, StubResponse};

/// Context over the mocks with clipboard restore enabled
pub fn context<'a>(
    service: &'a dyn Service,
    inference: &'a MockInference,
    bridge: &'a MockBridge,
) -> ServiceContext<'a> {
    ServiceContext {
        inference,
        bridge,
        service_name: service.name(),
        restore_clipboard: true,
    }
}
