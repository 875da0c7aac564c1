use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=VOICEVOX_CORE_LIB_DIR");

    // Runtime loading needs nothing from the build
    if env::var_os("CARGO_FEATURE_STATIC_LINK").is_none() {
        return;
    }

    match env::var("VOICEVOX_CORE_LIB_DIR") {
        Ok(dir) => {
            println!("cargo:rustc-link-search=native={dir}");
            if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows") {
                println!("cargo:rustc-link-arg=-Wl,-rpath,{dir}");
            }
        }
        Err(_) => {
            println!(
                "cargo:warning=VOICEVOX_CORE_LIB_DIR not set; relying on the system linker path for voicevox_core"
            );
        }
    }
}
