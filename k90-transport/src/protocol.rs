//! Protocol constants for the K90 vendor control interface
//!
//! Commands are USB vendor control transfers addressed to the device
//! (`bmRequestType` = vendor | device recipient). The `bRequest` byte selects
//! the operation; small arguments travel in `wValue`, the profile selector for
//! bulk writes travels in `wIndex`.

/// Corsair USB vendor ID
pub const VENDOR_ID: u16 = 0x1b1c;

/// Vengeance K90 product ID
pub const PRODUCT_ID: u16 = 0x1b02;

/// Interface number that carries the special functions (G-keys, M-keys, LEDs)
pub const SPECIAL_INTERFACE: u8 = 0;

/// Number of G-keys on the keyboard
pub const GKEY_COUNT: usize = 18;

/// Number of on-device profile slots
pub const PROFILE_COUNT: u8 = 3;

/// Vendor request codes (`bRequest`)
pub mod request {
    /// Set backlight brightness (OUT, level in wValue)
    pub const BRIGHTNESS: u8 = 49;
    /// Set macro mode or drive the record LED (OUT, constant in wValue)
    pub const MACRO_MODE: u8 = 2;
    /// Read the 8-byte status block (IN)
    pub const STATUS: u8 = 4;
    /// Read the 2-byte macro mode word (IN)
    pub const GET_MODE: u8 = 5;
    /// Select the active profile (OUT, profile in wValue)
    pub const PROFILE: u8 = 20;
    /// Profile key-binding blob (OUT, profile in wIndex)
    pub const PROFILE_BINDINGS: u8 = 16;
    /// Profile key-assignment blob (OUT, profile in wIndex)
    pub const PROFILE_KEYS: u8 = 22;
    /// Profile macro/lighting data blob (OUT, profile in wIndex)
    pub const PROFILE_DATA: u8 = 18;
}

/// wValue constants for `request::MACRO_MODE` when switching macro mode
pub mod macro_mode {
    /// Macros are played back by host software
    pub const SW: u16 = 0x0030;
    /// Macros are played back by the keyboard firmware
    pub const HW: u16 = 0x0001;
}

/// wValue constants for `request::MACRO_MODE` when driving the record LED
///
/// Same opcode as macro mode switching, distinct value space.
pub mod record_led {
    pub const ON: u16 = 0x0020;
    pub const OFF: u16 = 0x0040;
}

/// Payload bounds
pub mod limits {
    /// Maximum key-binding blob size
    pub const BINDINGS_MAX_LEN: usize = 128;
    /// Maximum key-assignment blob size
    pub const KEYS_MAX_LEN: usize = 64;
    /// Maximum data blob size (largest size verified on hardware)
    pub const DATA_MAX_LEN: usize = 4096;
    /// Status block length
    pub const STATUS_LEN: usize = 8;
    /// Mode word length
    pub const MODE_LEN: usize = 2;
    /// Highest backlight level
    pub const BACKLIGHT_MAX: u8 = 3;
    /// Highest record LED level
    pub const RECORD_LED_MAX: u8 = 1;
}

/// HID usage ids reported by the keyboard
pub mod usage {
    /// G1
    pub const GKEY_FIRST: u16 = 0xd0;
    /// G16
    pub const GKEY_LAST: u16 = 0xdf;
    /// G17
    pub const GKEY_EXT_FIRST: u16 = 0xe8;
    /// G18
    pub const GKEY_EXT_LAST: u16 = 0xe9;

    /// Start of the reserved device-control range
    pub const SPECIAL_MIN: u16 = 0xf0;
    /// End of the reserved device-control range
    pub const SPECIAL_MAX: u16 = 0xff;

    pub const M1: u16 = 0xf1;
    pub const M2: u16 = 0xf2;
    pub const M3: u16 = 0xf3;

    pub const META_OFF: u16 = 0xf4;
    pub const META_ON: u16 = 0xf5;

    pub const MACRO_RECORD_START: u16 = 0xf6;
    pub const MACRO_RECORD_STOP: u16 = 0xf7;

    pub const LIGHT_OFF: u16 = 0xfa;
    pub const LIGHT_DIM: u16 = 0xfb;
    pub const LIGHT_MEDIUM: u16 = 0xfc;
    pub const LIGHT_BRIGHT: u16 = 0xfd;

    /// Mask selecting the usage id from a full `page << 16 | id` usage
    pub const ID_MASK: u32 = 0x0000_ffff;
}

/// Transfer timing
pub mod timing {
    /// Timeout applied to every control transfer (USB_CTRL_SET_TIMEOUT)
    pub const CONTROL_TIMEOUT_MS: u64 = 5000;
    /// Input report read timeout; bounds how often the reader checks for shutdown
    pub const REPORT_READ_TIMEOUT_MS: i32 = 50;
    /// Back-off after a failed input report read
    pub const REPORT_ERROR_SLEEP_MS: u64 = 100;
}
