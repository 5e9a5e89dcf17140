// Library root: standings computation and match reconciliation for a
// football league table built from third-party competition data.

pub mod classify;
pub mod config;
pub mod feed;
pub mod form;
pub mod manual;
pub mod match_record;
pub mod session;
pub mod standings;
