//! Repository tests against a live PostgreSQL database.

mod community_tests;
mod curation_tests;
mod dmca_tests;
mod maintenance_tests;
mod mirror_tests;
mod report_tests;
mod reputation_tests;
mod revenue_tests;
mod staging_clip_tests;
mod submission_tests;
mod verification_tests;
