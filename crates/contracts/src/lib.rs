//! Shared contracts between the backend and its API consumers:
//! aggregate base types, the student aggregate and its DTO, bulk-import
//! row/outcome/report types and dashboard DTOs.

pub mod dashboards;
pub mod domain;
