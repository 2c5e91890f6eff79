//! Outback Mate RS-232 status protocol
//!
//! This crate decodes the status lines an Outback Mate hub prints on its serial
//! port into typed records for FX inverters and MX charge controllers.
//!
//! # Protocol Overview
//!
//! Each device on the hub reports once per second with one ASCII line:
//!
//! ```text
//! \n0,05,00,02,118,118,00,03,000,02,539,129,160,62\r
//! ```
//!
//! - The line opens with `\n` and closes with `\r`
//! - Fields are comma separated; the first is a single-character address
//! - Addresses `'0'..=':'` are FX inverters, `'A'..='K'` are MX controllers
//! - The family fixes the field schema (14 fields for both)
//!
//! # Pipeline
//!
//! [`frame`] → [`ChecksumValidator`] → [`classify`] → [`map_fields`] →
//! [`interpret`] → [`RecordStore`] → [`Dispatcher`]. [`Mate`] wires these
//! together behind a single [`Mate::process`] call.
//!
//! # Example
//!
//! ```rust
//! use mate_protocol::{Address, Mate, SystemVoltage};
//!
//! let mut mate = Mate::new(SystemVoltage::V48);
//! mate.process(b"\nA,00,10,05,072,123,00,00,000,02,540,000,000,48\r")?;
//!
//! let record = mate.get_interpreted(Address::new(b'A')).unwrap();
//! assert_eq!(record.get("daily_kwh").unwrap().to_string(), "12.3");
//! # Ok::<(), mate_protocol::MateError>(())
//! ```

mod checksum;
mod codec;
mod device;
mod dispatch;
mod error;
mod frame;
mod interpret;
mod pipeline;
mod schema;
mod store;

pub use checksum::*;
pub use codec::*;
pub use device::*;
pub use dispatch::*;
pub use error::*;
pub use frame::*;
pub use interpret::*;
pub use pipeline::*;
pub use schema::*;
pub use store::*;
