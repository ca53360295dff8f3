//! Generated protobuf and tonic code for the `user_v1` package.

#[allow(clippy::all)]
pub mod user_v1 {
    tonic::include_proto!("user_v1");
}

/// Encoded descriptor set, served through gRPC reflection.
pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("user_v1_descriptor");
