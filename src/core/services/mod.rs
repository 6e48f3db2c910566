pub mod identity_container;
pub mod message_codec;
pub mod shared_identity;
pub mod storage_codec;
