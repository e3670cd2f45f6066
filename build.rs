use std::env;
use std::path::PathBuf;
use std::process::Command;

const REQUIRED_LIBRARIES: [&str; 5] = [
    "libavformat",
    "libavcodec",
    "libavdevice",
    "libswscale",
    "libavutil",
];

fn main() {
    for variable in ["FFMPEG_DIR", "PKG_CONFIG_PATH", "VCPKG_ROOT", "VCPKGRS_TRIPLET"] {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    if env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    match env::var("CARGO_CFG_TARGET_OS").unwrap_or_default().as_str() {
        "windows" => check_vcpkg(),
        _ => check_pkg_config(),
    }
}

/// Warn about FFmpeg libraries pkg-config cannot see. Camera capture needs
/// `libavdevice`, which some distributions package separately.
fn check_pkg_config() {
    let missing: Vec<&str> = REQUIRED_LIBRARIES
        .iter()
        .copied()
        .filter(|library| {
            Command::new("pkg-config")
                .args(["--exists", library])
                .status()
                .map(|status| !status.success())
                .unwrap_or(false)
        })
        .collect();

    if !missing.is_empty() {
        println!(
            "cargo:warning=pkg-config cannot find {}. Install the FFmpeg development packages or set FFMPEG_DIR.",
            missing.join(", ")
        );
    }
}

fn check_vcpkg() {
    let Ok(root) = env::var("VCPKG_ROOT") else {
        println!(
            "cargo:warning=Neither FFMPEG_DIR nor VCPKG_ROOT is set. Install FFmpeg (with avdevice) via vcpkg and set FFMPEG_DIR."
        );
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let installed = PathBuf::from(root).join("installed").join(triplet);
    if installed.exists() {
        println!(
            "cargo:warning=Using vcpkg FFmpeg at {}; set FFMPEG_DIR to that path to silence this message.",
            installed.display()
        );
    } else {
        println!(
            "cargo:warning=No vcpkg FFmpeg install found at {}.",
            installed.display()
        );
    }
}
