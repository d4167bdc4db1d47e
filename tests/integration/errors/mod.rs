//! Error mapping for vault and registration failures

mod registration_test;
