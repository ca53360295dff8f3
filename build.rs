use std::{env, path::PathBuf};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use the bundled protoc so the build doesn't depend on a system install.
    env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    tonic_build::configure()
        .build_client(false)
        .file_descriptor_set_path(out_dir.join("user_v1_descriptor.bin"))
        .compile_protos(
            &[PathBuf::from("proto/user_v1/user.proto")],
            &[PathBuf::from("proto"), protoc_bin_vendored::include_path()?],
        )?;

    println!("cargo:rerun-if-changed=proto");
    Ok(())
}
