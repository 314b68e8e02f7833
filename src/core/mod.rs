pub mod borrowers;
pub mod calculator;
pub mod codec;
pub mod dispatch;
pub mod identity;
pub mod otp;
pub mod rates;
pub mod users;

pub use crate::domain::model::{BorrowerRecord, DerivedFields, LoanInputs};
pub use crate::domain::ports::{OtpSender, OtpStore, SheetStore};
pub use crate::utils::error::Result;
