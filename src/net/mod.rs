//! Network modules.
//!
//! Each is fed by a network library callback that runs on that library's
//! own task: the CoAP client, the MQTT client, the WebSocket server, the
//! WebSocket client and the ESP-NOW driver.

pub mod coap;
pub mod espnow;
pub mod mqtt;
pub mod websocket;
pub mod websocket_client;

use core::fmt::Write;

use heapless::String;

/// Dotted-quad text of an IPv4 address.
pub fn format_ipv4(ip: [u8; 4]) -> String<15> {
    let mut s = String::new();
    let _ = write!(s, "{}.{}.{}.{}", ip[0], ip[1], ip[2], ip[3]);
    s
}
