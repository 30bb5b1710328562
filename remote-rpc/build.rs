// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Create .generated directory if it doesn't exist
    std::fs::create_dir_all(".generated")?;

    // Ensure a protoc binary is available for the build, sourcing a vendored
    // one when the system does not provide it.
    if std::env::var_os("PROTOC").is_none() {
        if let Ok(protoc) = protoc_bin_vendored::protoc_bin_path() {
            std::env::set_var("PROTOC", protoc);
        }
    }

    tonic_prost_build::configure()
        .out_dir(".generated")
        .compile_protos(&["proto/faas.proto"], &["proto"])?;
    Ok(())
}
