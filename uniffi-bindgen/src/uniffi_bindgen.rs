//! Generates the Kotlin and Swift bindings of `tagkit-core`.

fn main() {
    uniffi::uniffi_bindgen_main();
}
