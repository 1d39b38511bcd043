//! Bluetooth Low Energy modules.
//!
//! Three bridged channels, each fed from the BLE host stack's callbacks:
//!
//! 1. **Peripheral** - GATT server role: connections, characteristic
//!    writes and pairing prompts.
//! 2. **Central** - GATT client role with security: connections,
//!    notifications and pairing prompts.
//! 3. **Client** - plain GATT client: characteristic notifications and
//!    scan results, on two independent callback slots.
//!
//! Addresses are formatted in the host stack's callback so records never
//! borrow stack-owned memory.

pub mod adv;
pub mod central;
pub mod client;
pub mod peripheral;

use core::fmt::Write;

use heapless::String;

use crate::record::{Field, Payload};

/// `aa:bb:cc:dd:ee:ff`, most significant byte first.
pub type AddressText = String<17>;

/// Format a 6-byte device address (most significant byte first).
pub fn format_address(address: &[u8; 6]) -> AddressText {
    let mut s = String::new();
    for (i, b) in address.iter().enumerate() {
        if i > 0 {
            let _ = s.push(':');
        }
        let _ = write!(s, "{:02x}", b);
    }
    s
}

/// Outcome of a pairing procedure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AuthStatus {
    pub authenticated: bool,
    pub encrypted: bool,
    pub bonded: bool,
}

impl AuthStatus {
    pub(crate) fn payload(&self) -> Payload<'static> {
        Payload::new()
            .with("isAuthenticated", Field::Bool(self.authenticated))
            .with("isEncrypted", Field::Bool(self.encrypted))
            .with("isBonded", Field::Bool(self.bonded))
    }
}
