//! Plain BLE client module.
//!
//! Notifications and scan results arrive from different host-stack
//! callbacks and are registered from script separately, so each gets its
//! own channel: `ble_client` for notifications and `ble_scan` for scans.

use heapless::String;

use crate::ble::adv;
use crate::ble::{format_address, AddressText};
use crate::config::{
    BLE_NOTIFY_OVERFLOW, BLE_NOTIFY_QUEUE_DEPTH, BLE_SCAN_OVERFLOW, BLE_SCAN_QUEUE_DEPTH,
};
use crate::engine::ScriptEngine;
use crate::module::{EventSource, Module};
use crate::queue::{Emit, Producer};
use crate::record::{Event, Field, OwnedBytes, OwnedText, Payload};

pub const NOTIFY_NAME: &str = "ble_client";
pub const SCAN_NAME: &str = "ble_scan";

// ═══════════════════════════════════════════════════════════════════════════
// Notifications
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyEvent {
    pub uuid: OwnedText,
    pub data: OwnedBytes,
    /// `false` for an indication.
    pub is_notify: bool,
}

impl Event for NotifyEvent {
    fn name(&self) -> &'static str {
        "notify"
    }

    fn payload(&self) -> Option<Payload<'_>> {
        Some(
            Payload::new()
                .with("uuid", Field::Text(&self.uuid))
                .with("data", Field::Bytes(&self.data))
                .with("is_notify", Field::Bool(self.is_notify)),
        )
    }
}

#[derive(Clone)]
pub struct NotifyProducer {
    producer: Producer<NotifyEvent, BLE_NOTIFY_QUEUE_DEPTH>,
}

impl NotifyProducer {
    pub fn new(producer: Producer<NotifyEvent, BLE_NOTIFY_QUEUE_DEPTH>) -> Self {
        Self { producer }
    }

    pub fn on_notify(&self, uuid: &str, data: &[u8], is_notify: bool) -> Emit {
        self.producer.emit_with(|| {
            Some(NotifyEvent {
                uuid: OwnedText::try_copy(uuid)?,
                data: OwnedBytes::try_copy(data)?,
                is_notify,
            })
        })
    }
}

pub type NotifyModule<E, S> = Module<E, S, BLE_NOTIFY_QUEUE_DEPTH>;

pub fn notify_module<E, S>(source: S) -> NotifyModule<E, S>
where
    E: ScriptEngine,
    S: EventSource<BLE_NOTIFY_QUEUE_DEPTH, Event = NotifyEvent>,
{
    Module::new(NOTIFY_NAME, source, BLE_NOTIFY_OVERFLOW)
}

// ═══════════════════════════════════════════════════════════════════════════
// Scanning
// ═══════════════════════════════════════════════════════════════════════════

/// One advertiser seen during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub address: AddressText,
    /// Raw advertisement payload.
    pub advertisement: OwnedBytes,
    pub rssi: i8,
    pub name: Option<String<32>>,
    pub service_uuid: Option<String<6>>,
    pub tx_power: Option<i8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Result(ScanResult),
    /// The scan window elapsed; `count` results were reported.
    Complete { count: u32 },
}

impl Event for ScanEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Result(_) => "scan_result",
            Self::Complete { .. } => "scan_complete",
        }
    }

    fn payload(&self) -> Option<Payload<'_>> {
        match self {
            Self::Result(r) => Some(
                Payload::new()
                    .with("address", Field::Text(&r.address))
                    .with("advertisement", Field::Bytes(&r.advertisement))
                    .with("rssi", Field::Int(r.rssi.into()))
                    .with_opt("name", r.name.as_deref().map(Field::Text))
                    .with_opt("serviceUuid", r.service_uuid.as_deref().map(Field::Text))
                    .with_opt("txPower", r.tx_power.map(|p| Field::Int(p.into()))),
            ),
            Self::Complete { count } => Some(Payload::new().with("count", Field::Uint(*count))),
        }
    }
}

#[derive(Clone)]
pub struct ScanProducer {
    producer: Producer<ScanEvent, BLE_SCAN_QUEUE_DEPTH>,
}

impl ScanProducer {
    pub fn new(producer: Producer<ScanEvent, BLE_SCAN_QUEUE_DEPTH>) -> Self {
        Self { producer }
    }

    /// `advertisement` is parsed here, in the callback, and copied.
    pub fn on_result(&self, address: &[u8; 6], advertisement: &[u8], rssi: i8) -> Emit {
        self.producer.emit_with(|| {
            Some(ScanEvent::Result(ScanResult {
                address: format_address(address),
                advertisement: OwnedBytes::try_copy(advertisement)?,
                rssi,
                name: adv::local_name(advertisement),
                service_uuid: adv::service_uuid16(advertisement).map(adv::format_uuid16),
                tx_power: adv::tx_power(advertisement),
            }))
        })
    }

    pub fn on_complete(&self, count: u32) -> Emit {
        self.producer.emit(ScanEvent::Complete { count })
    }
}

pub type ScanModule<E, S> = Module<E, S, BLE_SCAN_QUEUE_DEPTH>;

pub fn scan_module<E, S>(source: S) -> ScanModule<E, S>
where
    E: ScriptEngine,
    S: EventSource<BLE_SCAN_QUEUE_DEPTH, Event = ScanEvent>,
{
    Module::new(SCAN_NAME, source, BLE_SCAN_OVERFLOW)
}
