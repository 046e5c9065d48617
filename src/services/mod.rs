pub mod digest_service;

pub use digest_service::DigestService;
