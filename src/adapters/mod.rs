// Adapters: concrete implementations of the domain ports (Sheets REST, in-memory stores, OTP delivery).

pub mod auth;
pub mod memory;
pub mod otp;
pub mod sheets;

pub use memory::InMemorySheetStore;
pub use otp::{InMemoryOtpStore, LogOtpSender};
pub use sheets::SheetsClient;
