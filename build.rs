fn main() {
    println!("cargo:rerun-if-changed=routes.json");
    built::write_built_file().expect("Failed to acquire build-time information");
}
