fn main() {
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os == "espidf" {
        embuild::espidf::sysenv::output();
    }

    if std::env::var("CARGO_FEATURE_TFLITE_MICRO").is_ok() {
        // Xtensa toolchain installed by embuild, e.g.
        // .embuild/espressif/tools/xtensa-esp-elf/esp-<VER>/xtensa-esp-elf/bin/xtensa-esp32s3-elf-g++
        let compiler = find_compiler().unwrap_or_else(|| "xtensa-esp32s3-elf-g++".into());
        build_model(&compiler);
    }
}

fn find_compiler() -> Option<std::path::PathBuf> {
    use std::path::PathBuf;
    // Check local .embuild first, then global ~/.espressif
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").ok()?;
    let search_dirs = vec![
        PathBuf::from(manifest_dir).join(".embuild"),
        dirs::home_dir().map(|h| h.join(".espressif")).unwrap_or_default(),
    ];

    for root in search_dirs {
        let tools_dir = root.join("espressif/tools/xtensa-esp-elf");
        if !tools_dir.exists() {
            continue;
        }
        let Ok(entries) = std::fs::read_dir(&tools_dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                let candidate = path.join("xtensa-esp-elf/bin/xtensa-esp32s3-elf-g++");
                if candidate.exists() {
                    return Some(candidate);
                }
            }
        }
    }
    None
}

/// Compile the TensorFlow Lite Micro runtime together with the `serve_model_*`
/// C shim and the exported model array found under `serve-model/`.
fn build_model(compiler_path: &std::path::Path) {
    use std::path::PathBuf;

    let sdk_root = PathBuf::from("serve-model");

    let mut build = cc::Build::new();

    build
        .cpp(true)
        .compiler(compiler_path)
        .flag("-std=c++17")
        .flag("-O3")
        .flag("-fno-rtti")
        .flag("-fno-exceptions")
        .define("TF_LITE_STATIC_MEMORY", None)
        .define("TF_LITE_DISABLE_X86_NEON", None)
        .include(&sdk_root)
        .include(sdk_root.join("src"))
        .include(sdk_root.join("third_party/flatbuffers/include"))
        .include(sdk_root.join("third_party/gemmlowp"));

    add_source_files(&mut build, &sdk_root.join("src"));

    build.compile("serve-model");

    println!("cargo:rerun-if-changed=serve-model");
}

fn add_source_files(build: &mut cc::Build, dir: &std::path::Path) {
    for entry in std::fs::read_dir(dir).expect("Failed to read directory") {
        let entry = entry.expect("Failed to read directory entry");
        let path = entry.path();

        if path.is_dir() {
            add_source_files(build, &path);
        } else if let Some(ext) = path.extension() {
            // Test and benchmark translation units carry their own main().
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            if stem.ends_with("_test") || stem.ends_with("_benchmark") {
                continue;
            }
            if ext == "c" || ext == "cpp" || ext == "cc" {
                build.file(&path);
            }
        }
    }
}
