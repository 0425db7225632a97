//! End-to-end tests driving the reqwest gateway against wiremock servers

mod crawl_tests;
mod link_tests;
mod support;
