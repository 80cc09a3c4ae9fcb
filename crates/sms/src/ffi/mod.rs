//! FFI bindings for UniFFI export
//!
//! This module provides Swift/Kotlin bindings for the sms crate via UniFFI.
//!
//! ## Usage from Kotlin
//!
//! ```kotlin
//! initLogging(callback = logcatLogger, maxLevel = FfiLogLevel.INFO)
//!
//! val service = SmsService.withProvider(
//!     dbPath = context.getDatabasePath("mmssms.db").path,
//!     permissions = permissionChecker,
//!     transport = smsManagerTransport,
//!     operationTimeoutMs = null,
//! )
//!
//! val sub = service.subscribe(FfiEventKind.SMS_RECEIVED, callback)
//! val result = service.sendSms("555", "hello", deliveryReceipt = true)
//!
//! // From the host's BroadcastReceiver
//! service.publishNativeEvent(FfiEvent.SmsReceived(message))
//! ```
//!
//! ## Usage from Swift
//!
//! ```swift
//! let service = SmsService.withCompose(presenter: composePresenter)
//! let result = await service.sendSms(address: "555", body: "hello", deliveryReceipt: false)
//! ```

mod logging;
mod service;
mod types;

pub use logging::{init_ffi_logger, init_logging, set_log_callback, set_log_level, set_logging_level};
pub use service::*;
pub use types::*;
