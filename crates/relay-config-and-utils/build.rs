fn main() {
    // option_env!() values are cached between builds unless cargo is told
    // to watch them.
    println!("cargo:rerun-if-env-changed=CUSTOMS_RELAY_DEFAULT_URL");
    println!("cargo:rerun-if-env-changed=CUSTOMS_RELAY_DEFAULT_DATA_PATH");
}
