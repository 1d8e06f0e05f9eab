use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    let buildtime = std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        });
    println!("cargo:rustc-env=TAGFORM_BUILDTIME={buildtime}");

    if let Ok(target) = std::env::var("TARGET") {
        println!("cargo:rustc-env=TAGFORM_BUILD_TARGET={target}");
    }
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    println!("cargo:rerun-if-env-changed=TARGET");
}
