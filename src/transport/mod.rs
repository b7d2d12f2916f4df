// Public API - what other modules can use
pub use chat::ChatTransport;
pub use gateway::{gateway_handler, GatewayFrame, GatewayTransport};
pub use types::{
    AnchorMessage, Channel, ControlAction, ControlButton, ControlSurface, InboundMessage,
    MessageHandle,
};

// Internal modules
mod chat;
mod gateway;
mod types;
