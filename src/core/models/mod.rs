pub mod envelope;
pub mod identity_summary;
pub mod keypair;
pub mod message;
pub mod storage_record;
pub mod user_id;
