mod common;
mod deploy_tests;
mod diff_tests;
mod dry_run_tests;
mod store_tests;
