pub mod store_audit_logger;
