use std::env;
use std::fs;
use std::path::Path;

// Places config.toml next to the compiled binary so the server picks it up
// when launched from the target directory.
fn main() {
    println!("cargo:rerun-if-changed=../../config.toml");

    let out_dir = env::var("OUT_DIR").unwrap();
    let profile = env::var("PROFILE").unwrap();

    // OUT_DIR is target/<profile>/build/backend-*/out; walk up to target/<profile>
    let target_dir = match Path::new(&out_dir)
        .ancestors()
        .find(|p| p.ends_with(&profile))
    {
        Some(dir) => dir.to_path_buf(),
        None => return,
    };

    let workspace_root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("Could not find workspace root");

    let source_config = workspace_root.join("config.toml");
    if source_config.exists() {
        if let Err(e) = fs::copy(&source_config, target_dir.join("config.toml")) {
            println!("cargo:warning=Failed to copy config.toml: {}", e);
        }
    } else {
        println!(
            "cargo:warning=config.toml not found at {:?}, using default config",
            source_config
        );
    }
}
