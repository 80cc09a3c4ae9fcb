//! UniFFI bindgen binary for generating Swift/Kotlin bindings
//!
//! Usage:
//!   cargo run -p sms-ffi --features bindgen --bin uniffi-bindgen generate \
//!       --library target/release/libsms_ffi.so \
//!       --language kotlin \
//!       --out-dir generated/kotlin

fn main() {
    uniffi::uniffi_bindgen_main()
}
