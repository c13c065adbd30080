use chrono::Utc;
use std::env;

#[allow(dead_code)]
#[path = "src/civil.rs"]
mod civil;

use civil::DateTime;

fn main() {
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    println!("cargo:rerun-if-changed=build.rs");
    // Any source change gets a fresh stamp
    println!("cargo:rerun-if-changed=src");

    // Reproducible builds pin the stamp through SOURCE_DATE_EPOCH
    let build_secs = match env::var("SOURCE_DATE_EPOCH") {
        Ok(v) => v.trim().parse::<i64>().unwrap_or_else(|e| {
            println!("cargo:warning=Ignoring invalid SOURCE_DATE_EPOCH {:?}: {}", v, e);
            Utc::now().timestamp()
        }),
        Err(_) => Utc::now().timestamp(),
    };

    match DateTime::from_unix_est(build_secs) {
        Some(stamp) => println!("cargo:rustc-env=GARAGESP_COMPILE_DATE={}", stamp),
        None => panic!("build timestamp {} is out of range", build_secs),
    }

    // Linker scripts for esp-hal and esp-wifi, firmware only
    if env::var("CARGO_CFG_TARGET_ARCH").as_deref() == Ok("riscv32") {
        println!("cargo:rustc-link-arg-bins=-Tlinkall.x");
        println!("cargo:rustc-link-arg-bins=-Trom_functions.x");
    }
}
