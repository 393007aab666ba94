
mod pricing_service_tests;
