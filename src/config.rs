//! Application-wide constants and compile-time configuration.
//!
//! Queue depths and overflow policies for every bridged module live here
//! so they can be tuned in one place. Every Module Queue is bounded; the
//! depth is the number of records that may wait between two loop ticks.

use crate::queue::Overflow;

// Lifecycle

/// Attempts made to detach a native callback before teardown gives up
/// and leaves the module in `Stopping`.
pub const DETACH_ATTEMPTS: u8 = 3;

/// Maximum number of modules a registry can hold.
pub const MAX_MODULES: usize = 16;

/// Maximum number of fields in one event payload.
pub const MAX_PAYLOAD_FIELDS: usize = 8;

// BLE

/// BLE peripheral (GATT server) events: connect, write, pairing prompts.
pub const BLE_PERIPHERAL_QUEUE_DEPTH: usize = 16;
pub const BLE_PERIPHERAL_OVERFLOW: Overflow = Overflow::DropNewest;

/// BLE central (GATT client with security) events.
pub const BLE_CENTRAL_QUEUE_DEPTH: usize = 16;
pub const BLE_CENTRAL_OVERFLOW: Overflow = Overflow::DropNewest;

/// Characteristic notifications on the plain BLE client.
pub const BLE_NOTIFY_QUEUE_DEPTH: usize = 16;
pub const BLE_NOTIFY_OVERFLOW: Overflow = Overflow::DropNewest;

/// Scan results. One record per advertiser plus the completion marker.
pub const BLE_SCAN_QUEUE_DEPTH: usize = 32;
pub const BLE_SCAN_OVERFLOW: Overflow = Overflow::DropNewest;

// Network

/// CoAP responses. Responses past the depth are refused.
pub const COAP_QUEUE_DEPTH: usize = 4;
pub const COAP_OVERFLOW: Overflow = Overflow::DropNewest;

/// MQTT messages. A slow script sees the most recent messages.
pub const MQTT_QUEUE_DEPTH: usize = 8;
pub const MQTT_OVERFLOW: Overflow = Overflow::DropOldest;

/// WebSocket server connection and text-message events.
pub const WEBSOCKET_QUEUE_DEPTH: usize = 8;
pub const WEBSOCKET_OVERFLOW: Overflow = Overflow::DropNewest;

/// WebSocket client connection state and text messages. A script that
/// falls behind sees the most recent ones.
pub const WEBSOCKET_CLIENT_QUEUE_DEPTH: usize = 8;
pub const WEBSOCKET_CLIENT_OVERFLOW: Overflow = Overflow::DropOldest;

/// ESP-NOW send confirmations and received frames.
pub const ESPNOW_QUEUE_DEPTH: usize = 8;
pub const ESPNOW_OVERFLOW: Overflow = Overflow::DropNewest;

// Input

/// Button edge events.
pub const INPUT_QUEUE_DEPTH: usize = 8;
pub const INPUT_OVERFLOW: Overflow = Overflow::DropNewest;

/// Number of physical buttons tracked by the input producer.
pub const MAX_BUTTONS: usize = 8;

/// Button debounce time (ms).
pub const BUTTON_DEBOUNCE_MS: u64 = 50;
