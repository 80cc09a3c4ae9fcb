//! UniFFI bindings crate for the sms library
//!
//! Wraps the sms crate for UniFFI library-mode binding generation by
//! re-exporting its FFI module and scaffolding.
//!
//! ## Building for Android
//!
//! 1. Build the library for the device ABIs:
//!    ```bash
//!    cargo build --release -p sms-ffi --target aarch64-linux-android
//!    ```
//!
//! 2. Generate Kotlin bindings:
//!    ```bash
//!    cargo run -p sms-ffi --features bindgen --bin uniffi-bindgen generate \
//!        --library target/aarch64-linux-android/release/libsms_ffi.so \
//!        --language kotlin \
//!        --out-dir generated/kotlin
//!    ```
//!
//! ## Building for iOS
//!
//! ```bash
//! cargo build --release -p sms-ffi --target aarch64-apple-ios
//! cargo run -p sms-ffi --features bindgen --bin uniffi-bindgen generate \
//!     --library target/aarch64-apple-ios/release/libsms_ffi.a \
//!     --language swift \
//!     --out-dir generated/swift
//! ```

pub use sms::ffi::*;

// Library mode needs the scaffolding exported from this crate too
sms::uniffi_reexport_scaffolding!();
