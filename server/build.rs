// bow_arena/server/build.rs

fn main() {
    // Package/version metadata logged by the binary at startup.
    built::write_built_file().expect("Failed to acquire build-time information");
    println!("cargo:rerun-if-changed=build.rs");
}
