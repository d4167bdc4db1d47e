//! End-to-end renewal flows against mock services

mod check_test;
mod config_test;
